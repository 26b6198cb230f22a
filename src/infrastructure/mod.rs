pub mod js_executor;
pub mod retry;

pub use js_executor::JsExecutor;
pub use retry::RetryPolicy;
