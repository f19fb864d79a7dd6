pub mod application;
pub mod job;
pub mod profile;

pub use application::{ApplicationRecord, GeneratedApplication, GenerationRequest};
pub use job::JobPosting;
pub use profile::ApplicantProfile;
