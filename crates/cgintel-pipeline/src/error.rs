use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Db(#[from] cgintel_db::DbError),

    #[error("scraper error: {0}")]
    Scraper(#[from] cgintel_scraper::ScraperError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Other(String),
}
