// Adapters layer: concrete implementations of the domain ports.

pub mod azure;

pub use azure::AzureClient;
