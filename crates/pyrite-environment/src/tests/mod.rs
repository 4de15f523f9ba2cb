mod helpers;

mod annotation_tests;
mod incremental_tests;
