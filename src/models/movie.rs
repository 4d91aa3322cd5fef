use serde::{Deserialize, Serialize};

/// A movie as returned by the metadata API. Only `id` and `title` are
/// guaranteed; everything else is display data the front-end card uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
}

impl Movie {
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            overview: None,
            release_date: None,
            vote_average: None,
            original_language: None,
        }
    }

    #[must_use]
    pub fn with_poster(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }

    /// Release year, when the date is present and well formed.
    #[must_use]
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| chrono::Datelike::year(&d))
    }
}

/// One page of a listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: Option<i64>,
    #[serde(default)]
    pub total_results: Option<i64>,
}
