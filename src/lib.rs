pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod reconciler;
pub mod similarity;
pub mod storage;
pub mod variations;
