// Job matching: job description skills vs. a stored profile, compared by
// embedding similarity with an exact-name fast path.

pub mod handlers;
pub mod job_match;
pub mod sections;
pub mod similarity;
