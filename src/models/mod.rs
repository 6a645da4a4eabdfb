pub mod url;

pub use url::{
    ClickEvent, ClickInfo, CreateUrlRequest, CreateUrlResponse, StatsView, UrlRecord, Validity,
};
