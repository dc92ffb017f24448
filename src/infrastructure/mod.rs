pub mod api_client;
pub mod dataset_source;
pub mod docker_cli;
pub mod http_client_factory;
pub mod http_probe;
pub mod model_store;
pub mod observability;

pub use api_client::PredictionApiClient;
pub use dataset_source::DatasetSource;
pub use docker_cli::ProcessCommandRunner;
pub use http_probe::HttpHealthProbe;
pub use model_store::ModelStore;
