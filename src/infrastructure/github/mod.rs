pub mod stats_provider;
