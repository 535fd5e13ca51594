//! Writing line protocol points

mod write_points;

pub use write_points::*;

#[cfg(test)]
mod test_write {
    use reqwest::header::CONTENT_ENCODING;

    use crate::{
        batch::{DummyPoints, MeasurementBatch},
        error::InfluxError,
        model::{Measurement, Precision},
        test_util::MockInflux,
        util::gunzip,
        InfluxClient, InfluxClientOptions, InfluxOp,
    };

    use super::WriteRequest;

    fn single_point() -> Measurement {
        Measurement::new("Tilt")
            .field_float("X", -100.0)
            .field_float("Y", 720.0)
            .field_float("T", 30.0)
            .timestamp_str("2015-12-30 10:36:43.567")
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_single_measurement() {
        let server = MockInflux::start().await;
        let client = server.client();

        let request = WriteRequest::new("unittestdb").body(single_point().to_bytes(3).unwrap()).precision(Precision::Nanosecond);
        let resp = client.write(request).send().await.unwrap();

        assert_eq!(204, resp.status.as_u16());

        let req = server.last_request();
        assert_eq!("POST", req.method.as_str());
        assert_eq!("/write", req.path);
        assert_eq!("unittestdb", req.params["db"]);
        assert_eq!("n", req.params["precision"]);
        assert!(!req.params.contains_key("rp"));
        assert!(!req.params.contains_key("consistency"));
        assert!(req.headers.get(CONTENT_ENCODING).is_none());
        assert_eq!(b"Tilt X=-100.000,Y=720.000,T=30.000 1451471803567000000\n".to_vec(), req.body);
        assert_eq!(Some(req.body.len()), resp.body_size);
    }

    #[tokio::test]
    async fn test_write_options_forwarded() {
        let server = MockInflux::start().await;
        let client = server.client().credentials("root", "pwd");

        let request = WriteRequest::new("unittestdb")
            .body(&b"Tilt5 X=-22.34,Y=653.8676,T=-4.1 1045513396921781872\n"[..])
            .retention_policy("one_week")
            .precision(Precision::Millisecond)
            .consistency("all");
        client.write(request).send().await.unwrap();

        let req = server.last_request();
        assert_eq!("one_week", req.params["rp"]);
        assert_eq!("ms", req.params["precision"]);
        assert_eq!("all", req.params["consistency"]);
        assert_eq!("root", req.params["u"]);
        assert_eq!("pwd", req.params["p"]);
    }

    #[tokio::test]
    async fn test_write_streamed_generator() {
        let server = MockInflux::start().await;
        let client = server.client();

        let mut dummies = DummyPoints::new("Tilt5").npoints(1000).decimals(4).delta_seconds(600).start_ns(1_000_000_000).seed(1);
        let mut replay = DummyPoints::new("Tilt5").npoints(1000).decimals(4).delta_seconds(600).start_ns(1_000_000_000).seed(1);

        let resp = client.write(WriteRequest::new("unittestdb").body(dummies.generate())).send().await.unwrap();
        assert_eq!(None, resp.body_size);

        let req = server.last_request();
        assert_eq!(replay.serialize(false).unwrap(), req.body);
        assert_eq!(1000, req.body.iter().filter(|b| **b == b'\n').count());
    }

    #[tokio::test]
    async fn test_write_batch_as_stream() {
        let server = MockInflux::start().await;

        let mut batch = MeasurementBatch::new(3);
        batch.append(single_point()).append(single_point().tag("sensor", "2"));
        let expected = batch.serialize(false).unwrap();

        server.client().write(WriteRequest::new("unittestdb").body(batch)).send().await.unwrap();
        assert_eq!(expected, server.last_request().body);
    }

    #[tokio::test]
    async fn test_write_compressed() {
        let server = MockInflux::start().await;
        let mut dummies = DummyPoints::new("Tilt").npoints(100);
        let plain = dummies.serialize(false).unwrap();

        server
            .client()
            .write(WriteRequest::new("unittestdb").body(plain.clone()).compress(true))
            .send()
            .await
            .unwrap();

        let req = server.last_request();
        assert_eq!("gzip", req.headers[CONTENT_ENCODING]);
        assert_eq!(plain, gunzip(&req.body));
    }

    #[tokio::test]
    async fn test_write_from_files() {
        let server = MockInflux::start().await;
        let client = server.client();
        let dir = tempfile::tempdir().unwrap();

        let mut batch = MeasurementBatch::new(4);
        batch.extend((0..10).map(|i| single_point().timestamp(i)));
        let plain = batch.serialize(false).unwrap();

        let txt = dir.path().join("dump.txt");
        batch.dump(&txt, false).unwrap();
        client.write(WriteRequest::new("unittestdb").file(&txt)).send().await.unwrap();
        assert_eq!(plain, server.last_request().body);

        let gz = dir.path().join("dump.gz");
        batch.dump(&gz, true).unwrap();
        client.write(WriteRequest::new("unittestdb").file(&gz).gzipped(true)).send().await.unwrap();
        let req = server.last_request();
        assert_eq!("gzip", req.headers[CONTENT_ENCODING]);
        assert_eq!(plain, gunzip(&req.body));
    }

    #[tokio::test]
    async fn test_write_missing_file() {
        let server = MockInflux::start().await;
        let res = server.client().write(WriteRequest::new("unittestdb").file("/definitely/not/here.txt")).send().await;
        assert!(matches!(res, Err(InfluxError::IoError(_))));
    }

    #[tokio::test]
    async fn test_write_rejected() {
        let server = MockInflux::start().await;
        server.respond("/write", 400, r#"{"error":"unable to parse 'Tilt X=': missing field value"}"#);

        let res = server.client().write(WriteRequest::new("unittestdb").body(b"Tilt X=\n".to_vec())).send().await;
        let e = res.unwrap_err();
        assert!(!e.is_possibly_written());
        assert!(matches!(e, InfluxError::ApiResponseError { operation: InfluxOp::Write, .. }));
        assert!(e.to_string().contains("missing field value"));
    }

    #[tokio::test]
    async fn test_write_timeout_is_transport_error() {
        let server = MockInflux::start().await;
        server.delay(2000);

        let res = server
            .client()
            .write(WriteRequest::new("unittestdb").body(single_point().to_bytes(3).unwrap()))
            .timeout_ms(100)
            .send()
            .await;

        match res {
            Err(InfluxError::TransportError(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried_then_surfaced() {
        crate::test_util::setup();

        // bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let options = InfluxClientOptions::new().retry_policy(crate::DefaultRetryPolicy {
            max_retry_times: 2,
            delay_ms: 10,
        });
        let client = InfluxClient::with_options("127.0.0.1", port, options).unwrap();

        let res = client.write(WriteRequest::new("unittestdb").body(single_point().to_bytes(3).unwrap())).send().await;
        match res {
            Err(InfluxError::TransportError(e)) => assert!(e.is_connect()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_encoding_error_is_reported_as_is() {
        let server = MockInflux::start().await;

        let mut batch = MeasurementBatch::new(3);
        batch.append(Measurement::new("ok").field_float("X", 1.0)).append(Measurement::new("no_fields"));

        let res = server.client_with_retries(2).write(WriteRequest::new("unittestdb").body(batch)).send().await;
        match res {
            Err(InfluxError::EncodingError(msg)) => assert!(msg.contains("no_fields")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_retried_up_to_budget() {
        let server = MockInflux::start().await;
        server.delay(500);

        let res = server
            .client_with_retries(2)
            .write(WriteRequest::new("unittestdb").body(single_point().to_bytes(3).unwrap()))
            .timeout_ms(100)
            .send()
            .await;

        assert!(matches!(res, Err(InfluxError::TransportError(_))));
        assert_eq!(3, server.requests().len());
    }

    #[tokio::test]
    async fn test_stream_body_sent_once() {
        let server = MockInflux::start().await;
        server.delay(500);

        let mut dummies = DummyPoints::new("Tilt").npoints(10).start_ns(1_000_000_000).seed(3);
        let res = server
            .client_with_retries(2)
            .write(WriteRequest::new("unittestdb").body(dummies.generate()))
            .timeout_ms(100)
            .send()
            .await;

        match res {
            Err(InfluxError::TransportError(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(1, server.requests().len());
    }

    #[tokio::test]
    async fn test_server_error_not_retried() {
        let server = MockInflux::start().await;
        server.respond("/write", 500, r#"{"error":"timeout"}"#);

        let e = server
            .client_with_retries(2)
            .write(WriteRequest::new("unittestdb").body(single_point().to_bytes(3).unwrap()))
            .send()
            .await
            .unwrap_err();

        assert!(e.is_possibly_written());
        assert_eq!(1, server.requests().len());
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let server = MockInflux::start().await;
        let client = server.client();

        let res = client.write(WriteRequest::new("").body(b"Tilt X=1.0\n".to_vec())).send().await;
        assert!(matches!(res, Err(InfluxError::ValidationFailed(_))));

        let res = client
            .write(WriteRequest::new("unittestdb").body(b"Tilt X=1.0\n".to_vec()).compress(true).gzipped(true))
            .send()
            .await;
        assert!(matches!(res, Err(InfluxError::ValidationFailed(_))));

        assert!(server.requests().is_empty());
    }
}
