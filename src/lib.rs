pub mod http_client;
pub mod model;
pub mod relay;
pub mod upstream;
