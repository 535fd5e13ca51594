/// Adds timeout overrides to an operation holding its own `client` clone.
/// The override only affects that clone, other operations keep the client's timeout
#[macro_export]
macro_rules! add_per_request_options {
    ($type_name:ty) => {
        impl $type_name {
            /// Set the timeout for this operation only, in milliseconds
            pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
                self.client.options.timeout_ms = Some(timeout_ms);
                self
            }

            /// Wait for the server as long as it takes, e.g. for a large streamed write.
            /// Transport failures other than timeouts are still reported
            pub fn no_timeout(mut self) -> Self {
                self.client.options.timeout_ms = None;
                self
            }
        }
    };
}
