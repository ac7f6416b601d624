use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// "Requirements:", "Qualifications:", "Skills:", "Responsibilities:", "Duties:"
static SECTION_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(requirements?|qualifications?|skills?|responsibilit(?:y|ies)|duties)\s*:")
        .unwrap()
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobSection {
    Requirements,
    Responsibilities,
    Other,
}

impl JobSection {
    fn from_header(word: &str) -> Self {
        let word = word.to_lowercase();
        if word.starts_with("respons") || word.starts_with("dut") {
            JobSection::Responsibilities
        } else {
            JobSection::Requirements
        }
    }
}

/// Section boundaries of a job description. Text before the first header is `Other`.
#[derive(Debug, Clone)]
pub struct JobSections {
    /// (byte offset where the section starts, section), ascending by offset
    boundaries: Vec<(usize, JobSection)>,
}

impl JobSections {
    pub fn parse(text: &str) -> Self {
        let mut boundaries = vec![(0, JobSection::Other)];
        for caps in SECTION_HEADER_RE.captures_iter(text) {
            if let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) {
                boundaries.push((whole.start(), JobSection::from_header(word.as_str())));
            }
        }
        Self { boundaries }
    }

    pub fn section_at(&self, offset: usize) -> JobSection {
        let idx = self.boundaries.partition_point(|(start, _)| *start <= offset);
        self.boundaries
            .get(idx.saturating_sub(1))
            .map(|(_, section)| *section)
            .unwrap_or(JobSection::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = "About us: we build payments.\n\
        Responsibilities: own services in Go.\n\
        Requirements: 5+ years Python, Kubernetes.";

    #[test]
    fn test_sections_by_offset() {
        let sections = JobSections::parse(JOB);
        assert_eq!(sections.section_at(JOB.find("payments").unwrap()), JobSection::Other);
        assert_eq!(sections.section_at(JOB.find("Go.").unwrap()), JobSection::Responsibilities);
        assert_eq!(sections.section_at(JOB.find("Python").unwrap()), JobSection::Requirements);
    }

    #[test]
    fn test_header_variants() {
        let text = "QUALIFICATIONS: Rust\nDuties: review code";
        let sections = JobSections::parse(text);
        assert_eq!(sections.section_at(text.find("Rust").unwrap()), JobSection::Requirements);
        assert_eq!(sections.section_at(text.find("review").unwrap()), JobSection::Responsibilities);
    }

    #[test]
    fn test_no_headers_is_other() {
        let sections = JobSections::parse("We need someone who knows Docker.");
        assert_eq!(sections.section_at(25), JobSection::Other);
    }
}
