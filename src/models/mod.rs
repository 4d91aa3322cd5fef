pub mod movie;
pub mod trending;
pub mod view;

pub use movie::{Movie, MoviePage};
pub use trending::{NewTrendingRecord, PosterUri, TrendingRecord};
pub use view::ViewState;
