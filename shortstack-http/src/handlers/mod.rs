use shortstack::SearchClient;

pub mod health;
pub mod search;

pub struct AppState {
    pub client: SearchClient,
}

pub use health::health;
pub use search::{batch_search, search};
