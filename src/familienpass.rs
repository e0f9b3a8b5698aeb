pub mod detail;
pub mod grouping;
pub mod listing;
pub mod model;
pub mod scrape;
pub mod sign_up;
pub mod text;
