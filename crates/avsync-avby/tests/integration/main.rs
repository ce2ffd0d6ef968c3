//! Integration tests for avsync-avby
//!
//! Uses wiremock to simulate the av.by API and verifies end-to-end
//! behavior of the AvbyClient and the marketplace provider: generation
//! lookups, last-sold queries, "no data" answers, and error statuses.

mod common;

mod test_generations;
mod test_last_sold;
