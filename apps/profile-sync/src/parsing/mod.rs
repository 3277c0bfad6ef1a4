pub mod merger;
pub mod poller;
