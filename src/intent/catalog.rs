use super::Intent;

/// Configured list of intents. Edit this function to add or remove
/// intents without touching classification logic.
#[inline]
pub fn default_catalog() -> Vec<Intent> {
    vec![
        Intent {
            id: "list_candidates".to_string(),
            name: "ListCandidates".to_string(),
            examples: vec![
                "list all candidates".to_string(),
                "show me the candidates".to_string(),
                "list of applicants".to_string(),
                "who are the candidates".to_string(),
                "show names".to_string(),
            ],
            keywords: vec![
                "candidate".to_string(),
                "candidates".to_string(),
                "applicant".to_string(),
                "applicants".to_string(),
                "name".to_string(),
            ],
        },
        Intent {
            id: "certifications".to_string(),
            name: "Certifications".to_string(),
            examples: vec![
                "what certifications".to_string(),
                "list certifications".to_string(),
                "certifications of umashankar".to_string(),
                "certified in".to_string(),
            ],
            keywords: vec![
                "certif".to_string(),
                "certification".to_string(),
                "full stack".to_string(),
                "certified".to_string(),
            ],
        },
        Intent {
            id: "education".to_string(),
            name: "Education".to_string(),
            examples: vec![
                "education details".to_string(),
                "degree".to_string(),
                "where did x study".to_string(),
                "m.tech".to_string(),
                "college".to_string(),
                "university".to_string(),
            ],
            keywords: vec![
                "education".to_string(),
                "m.tech".to_string(),
                "degree".to_string(),
                "college".to_string(),
                "university".to_string(),
            ],
        },
    ]
}
