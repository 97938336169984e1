pub mod rollup;
