/// A request object encapsulating all necessary information to perform a dynamic call.
#[derive(Debug, Clone)]
pub struct DynamicRequest {
    /// The JSON body of the request. Must be an Object `{}` matching the input message.
    pub body: serde_json::Value,
    /// Custom metadata (headers) to attach to the request.
    pub headers: Vec<(String, String)>,
    /// The fully qualified name of the service (e.g., `my.package.Service`).
    pub service: String,
    /// The name of the method to call (e.g., `SayHello`).
    pub method: String,
}
