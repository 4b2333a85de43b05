pub mod middleware;
pub mod poller;
pub mod routes;
pub mod state;
