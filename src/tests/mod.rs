mod common;
mod token_refresh;
