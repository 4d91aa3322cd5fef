pub mod tmdb {
    pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

    pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

    pub const DEFAULT_POSTER_SIZE: &str = "w500";
}

pub mod intervals {
    use std::time::Duration;

    pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

    pub const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);
}

pub mod limits {

    pub const TRENDING_LIMIT: usize = 5;

    pub const INPUT_BUFFER: usize = 64;
}

pub mod messages {

    pub const NO_MOVIES_FOUND: &str = "No movies found";

    pub const FETCH_MOVIES_FAILED: &str = "Error fetching movies";

    pub const NO_TRENDING_FOUND: &str = "No trending movies found";

    pub const FETCH_TRENDING_FAILED: &str = "Error fetching trending movies";
}
