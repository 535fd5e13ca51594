//! InfluxQL queries

mod query_points;

pub use query_points::*;

#[cfg(test)]
mod test_query {
    use crate::{error::InfluxError, model::Precision, test_util::MockInflux};

    use super::{QueryRequest, QueryResponse};

    const COUNT_BODY: &str = r#"{"results":[{"statement_id":0,"series":[
        {"name":"Tilt_1","columns":["time","count"],"values":[[0,1000]]},
        {"name":"Tilt_2","columns":["time","count"],"values":[[0,250]]}
    ]}]}"#;

    #[tokio::test]
    async fn test_query_count() {
        let server = MockInflux::start().await;
        server.respond("/query", 200, COUNT_BODY);

        let resp = server
            .client()
            .query(QueryRequest::new("unittestdb", "SELECT count(Y) FROM /Tilt_*/").epoch(Precision::Second))
            .send()
            .await
            .unwrap();

        let req = server.last_request();
        assert_eq!("GET", req.method.as_str());
        assert_eq!("/query", req.path);
        assert_eq!("unittestdb", req.params["db"]);
        assert_eq!("SELECT count(Y) FROM /Tilt_*/", req.params["q"]);
        assert_eq!("s", req.params["epoch"]);

        let names = resp.series().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["Tilt_1", "Tilt_2"], names);

        let total: i64 = resp.series().flat_map(|s| s.column_i64("count")).sum();
        assert_eq!(1250, total);
        assert!(resp.first_error().is_none());
    }

    #[test]
    fn test_parse_statement_error() {
        let body = r#"{"results":[{"statement_id":0,"error":"database not found: unittestdb"}]}"#;
        let resp: QueryResponse = serde_json::from_str(body).unwrap();

        assert_eq!(0, resp.series().count());
        assert_eq!(Some("database not found: unittestdb"), resp.first_error());
    }

    #[test]
    fn test_parse_group_by_tags() {
        let body = r#"{"results":[{"statement_id":0,"series":[
            {"name":"Tilt","tags":{"sensor":"1"},"columns":["time","mean"],"values":[["2015-12-30T10:36:43Z",1.5]]}
        ]}]}"#;
        let resp: QueryResponse = serde_json::from_str(body).unwrap();
        let series = resp.series().next().unwrap();

        assert_eq!("1", series.tags.as_ref().unwrap()["sensor"]);
        assert_eq!(Some(1), series.column_index("mean"));
        assert!(series.column_i64("time").is_empty());
        assert!(series.column_i64("missing").is_empty());
    }

    #[tokio::test]
    async fn test_query_bad_request() {
        let server = MockInflux::start().await;
        server.respond("/query", 400, r#"{"error":"error parsing query: found EOF"}"#);

        let res = server.client().query(QueryRequest::new("unittestdb", "SELECT")).send().await;
        match res {
            Err(e @ InfluxError::ApiResponseError { .. }) => {
                assert_eq!(Some(400), e.status_code().map(|c| c.as_u16()));
                assert!(!e.is_possibly_written());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_invalid_json() {
        let server = MockInflux::start().await;
        server.respond("/query", 200, "not json");

        let res = server.client().query(QueryRequest::new("unittestdb", "SHOW DATABASES")).send().await;
        assert!(matches!(res, Err(InfluxError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_empty_query_not_sent() {
        let server = MockInflux::start().await;

        let res = server.client().query(QueryRequest::new("unittestdb", "  ")).send().await;
        assert!(matches!(res, Err(InfluxError::ValidationFailed(_))));
        assert!(server.requests().is_empty());
    }
}
