use crate::constants::search;
use crate::errors::ToolError;
use crate::services::jsearch::PLATFORMS;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct PromptArg {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptDef {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArg>,
}

#[derive(Debug)]
pub struct RenderedPrompt {
    pub description: String,
    pub text: String,
}

static PROMPT_CATALOG: Lazy<Vec<PromptDef>> = Lazy::new(|| {
    vec![
        PromptDef {
            name: "analyze_job_market",
            description:
                "Guide the host LLM through a job-market analysis for a role and location",
            arguments: vec![
                arg("role", "Job role or title to analyze", true),
                arg("city", "Target city (provide country as well)", false),
                arg("country", "Target country", false),
                arg("platform", "Platform to focus on (linkedin, indeed, glassdoor)", false),
                arg("num_jobs", "Number of listings to analyze (1-20, default 5)", false),
            ],
        },
        PromptDef {
            name: "save_jobs",
            description: "Instruct the host LLM to save search results as a structured JSON file",
            arguments: vec![
                arg("jobs_dir", "Directory to save jobs into", true),
                arg("date", "Date of the search (YYYY-MM-DD)", true),
                arg("role", "Role that was searched", true),
                arg("city", "City that was searched", false),
                arg("country", "Country that was searched", false),
                arg("num_jobs", "Number of jobs to save (default 5)", false),
            ],
        },
        PromptDef {
            name: "mesh_resumes",
            description: "Instruct the host LLM to merge multiple resumes into one document",
            arguments: vec![
                arg("save_directory", "Directory to save the resume mesh", true),
                arg("resume_mesh_filename", "Base filename for the mesh (no extension)", true),
                arg("date", "Date suffix for the filename (YYYY-MM-DD)", true),
            ],
        },
        PromptDef {
            name: "generate_resume",
            description: "Instruct the host LLM to tailor a resume to a job description",
            arguments: vec![
                arg("save_directory", "Directory to save the resume", true),
                arg("role", "Role to tailor the resume for", true),
                arg("company", "Company to tailor the resume for", true),
                arg("job_description", "Job description text", true),
            ],
        },
        PromptDef {
            name: "generate_cover_letter",
            description: "Instruct the host LLM to write a cover letter for a job description",
            arguments: vec![
                arg("save_directory", "Directory to save the cover letter", true),
                arg("role", "Role to write the cover letter for", true),
                arg("company", "Company to address", true),
                arg("job_description", "Job description text", true),
            ],
        },
    ]
});

fn arg(name: &'static str, description: &'static str, required: bool) -> PromptArg {
    PromptArg {
        name,
        description,
        required,
    }
}

pub fn prompt_catalog() -> &'static Vec<PromptDef> {
    &PROMPT_CATALOG
}

pub fn prompt_by_name(name: &str) -> Option<&'static PromptDef> {
    PROMPT_CATALOG.iter().find(|p| p.name == name)
}

pub fn render_prompt(name: &str, args: &Value) -> Result<RenderedPrompt, ToolError> {
    let Some(def) = prompt_by_name(name) else {
        return Err(ToolError::invalid_argument(format!(
            "Unknown prompt: {}",
            name
        )));
    };
    for required in def.arguments.iter().filter(|a| a.required) {
        if required_arg(args, required.name).is_none() {
            return Err(ToolError::invalid_argument(format!(
                "Prompt {} requires argument '{}'",
                name, required.name
            )));
        }
    }
    let text = match def.name {
        "analyze_job_market" => render_analyze_job_market(args)?,
        "save_jobs" => render_save_jobs(args),
        "mesh_resumes" => render_mesh_resumes(args)?,
        "generate_resume" => render_generate_resume(args),
        "generate_cover_letter" => render_generate_cover_letter(args),
        _ => unreachable!(),
    };
    Ok(RenderedPrompt {
        description: def.description.to_string(),
        text,
    })
}

fn required_arg(args: &Value, name: &str) -> Option<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn optional_arg(args: &Value, name: &str) -> String {
    required_arg(args, name).unwrap_or_default()
}

fn num_jobs_arg(args: &Value, max: usize) -> usize {
    let raw = args
        .get("num_jobs")
        .map(|v| {
            v.as_i64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
        })
        .unwrap_or(None)
        .unwrap_or(search::DEFAULT_RESULTS as i64);
    raw.max(1).min(max as i64) as usize
}

pub fn sanitize_for_filename(text: &str) -> String {
    let lowered: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    lowered
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn render_analyze_job_market(args: &Value) -> Result<String, ToolError> {
    let role = optional_arg(args, "role");
    let city = optional_arg(args, "city");
    let country = optional_arg(args, "country");
    let platform = optional_arg(args, "platform").to_lowercase();
    if !platform.is_empty() && !PLATFORMS.contains(&platform.as_str()) {
        return Err(ToolError::invalid_argument(format!(
            "platform must be one of {}",
            PLATFORMS.join(", ")
        )));
    }
    let num_jobs = num_jobs_arg(args, search::MAX_RESULTS);

    Ok(format!(
        r#"# Job Market Analysis

You are a data-driven assistant. Analyze the job market for the top {num_jobs} positions matching the role below. Before running any tools, outline your approach in 3-5 bullet points.

## Target
- Role: `{role}`
- City: `{city}` (optional; requires country when set)
- Country: `{country}`
- Platform: `{platform}` (one of linkedin, indeed, glassdoor, or empty)

## Steps
1. Validate inputs: if `city` is non-empty, `country` must also be provided; if `platform` is non-empty it must be one of linkedin, indeed, glassdoor.
2. Run the `search_jobs` tool with the role, city, country, platform and num_jobs above.
3. Extract `title`, `company`, `description`, `salary`, `location` and work arrangement from each record.
4. Aggregate: count unique titles, identify the most frequent skills and keywords, compute salary average/median/range, tally remote vs onsite vs hybrid.

## Output
A markdown report with sections: Approach Overview, Data Summary, Insights & Trends, Recommendations.
"#
    ))
}

fn render_save_jobs(args: &Value) -> String {
    let jobs_dir = optional_arg(args, "jobs_dir");
    let date = optional_arg(args, "date");
    let role = optional_arg(args, "role");
    let city = optional_arg(args, "city");
    let country = optional_arg(args, "country");
    let num_jobs = num_jobs_arg(args, 100);

    let mut filename_parts = vec![date.clone(), sanitize_for_filename(&role)];
    if !city.is_empty() {
        filename_parts.push(sanitize_for_filename(&city));
    }
    if !country.is_empty() {
        filename_parts.push(sanitize_for_filename(&country));
    }
    filename_parts.push(num_jobs.to_string());
    let filename = format!("{}.json", filename_parts.join("_"));

    format!(
        r#"# Save Job Search Results

Save the job search results to a structured JSON file.

## File
- Directory: `{jobs_dir}` (create it if missing)
- Filename: exactly `{filename}`
- Format: a JSON array of job objects

## Structure per job
```json
{{
  "job_id": "unique identifier",
  "title": "job title",
  "company": "employer name",
  "city": "job location city",
  "country": "job location country",
  "description": "job description or summary",
  "apply_link": "application URL or null",
  "saved_date": "{date}",
  "search_criteria": {{
    "role": "{role}",
    "city": "{city}",
    "country": "{country}",
    "date_searched": "{date}"
  }}
}}
```

## Rules
- Use `null` for missing fields, never leave them undefined.
- No trailing commas; escape quotes; keep the array well-formed.
- Do not modify or truncate job data.
- Verify all {num_jobs} jobs saved, `apply_link` is a URL or null, and `job_id` values are unique.
- Use the `write_file` tool with the exact directory and filename above.
"#
    )
}

fn render_mesh_resumes(args: &Value) -> Result<String, ToolError> {
    let save_directory = optional_arg(args, "save_directory");
    let filename = optional_arg(args, "resume_mesh_filename");
    let date = optional_arg(args, "date");
    if filename != sanitize_for_filename(&filename) || filename.is_empty() {
        return Err(ToolError::invalid_argument(
            "resume_mesh_filename must contain only letters, digits, '-' and '_'",
        ));
    }

    Ok(format!(
        r#"# Resume Mesh

You have been given multiple resumes of the same person. Mesh them into one unified resume:

- Include every section from all input resumes; drop nothing.
- Merge sections with the exact same title into a single de-duplicated list.
- Keep sections with different titles for similar content as separate sections.
- Group work entries by employer + title + time frame; state Employer, Title, Location and Dates once, then combine all bullet points.
- Maintain chronological order within sections.
- Clean grammar and typos without altering meaning; preserve all dates, locations, company names and achievements.

## Output
A single markdown document optimized for LLM reading.

## Save
Use the `write_file` tool to save into `{save_directory}` with the exact filename `{filename}_{date}.md`.
"#
    ))
}

fn render_generate_resume(args: &Value) -> String {
    let save_directory = optional_arg(args, "save_directory");
    let role = optional_arg(args, "role");
    let company = optional_arg(args, "company");
    let job_description = optional_arg(args, "job_description");
    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let safe_role = sanitize_for_filename(&role);
    let safe_company = sanitize_for_filename(&company);

    format!(
        r#"# Generate a Tailored Resume

Act as a certified resume writer and ATS expert. Produce a markdown resume aligned with the `{role}` job description at `{company}`. Use ONLY information found in the provided resume mesh resource and the job description below; no invented dates, metrics or projects. If something is missing, stop and ask.

<job_description>
{job_description}
</job_description>

## Steps
1. List all job description requirements verbatim: technical, hard skills, soft skills.
2. For each requirement, locate matching bullets in the resume mesh; copy exact text or tight abstractions.
3. Prefer bullets containing both the required keyword and an achievement.
4. Assemble a concise markdown resume: same sections as the mesh, 3-4 bullets per role, each under 40 words, exact keywords from the job description, education and certifications copied exactly.
5. Confirm: "All content sourced 100% from the resume mesh."

## Save
Use the `write_file` tool to save into `{save_directory}` with the exact filename `{date}_{safe_company}_{safe_role}_resume.md`.
"#
    )
}

fn render_generate_cover_letter(args: &Value) -> String {
    let save_directory = optional_arg(args, "save_directory");
    let role = optional_arg(args, "role");
    let company = optional_arg(args, "company");
    let job_description = optional_arg(args, "job_description");
    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let safe_role = sanitize_for_filename(&role);
    let safe_company = sanitize_for_filename(&company);

    format!(
        r#"# Generate a Cover Letter

Act as a career consultant and ATS expert. Write a compelling cover letter for the `{role}` position at `{company}` using ONLY the job description below and the provided resume. No invented information; ask when something required is missing.

<job_description>
{job_description}
</job_description>

## Structure (AIDA)
1. Opening: a hook connecting your background to the company's mission, 2-3 sentences.
2. Qualifications: 3-4 bullets mapping resume experience to the top requirements, with exact keyword matches.
3. Value proposition: 2-3 sentences tying your achievements to their goals.
4. Call to action: professional closing with an interview invitation.

## Rules
- Conversational professional tone, short paragraphs, strong action verbs.
- Embed job description keywords naturally.
- Output ONLY the final markdown cover letter.

## Save
Use the `write_file` tool to save into `{save_directory}` with the exact filename `{date}_{safe_company}_{safe_role}_cover_letter.md`.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_lists_five_prompts() {
        assert_eq!(prompt_catalog().len(), 5);
        assert!(prompt_by_name("analyze_job_market").is_some());
    }

    #[test]
    fn sanitize_lowercases_and_collapses() {
        assert_eq!(
            sanitize_for_filename("Senior C++ Engineer!"),
            "senior_c_engineer"
        );
        assert_eq!(sanitize_for_filename("  Rust Dev  "), "rust_dev");
        assert_eq!(sanitize_for_filename("a__b___c"), "a_b_c");
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let err = render_prompt("analyze_job_market", &json!({})).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
        assert!(err.message.contains("role"));
    }

    #[test]
    fn analyze_prompt_mentions_role_and_tool() {
        let rendered = render_prompt(
            "analyze_job_market",
            &json!({"role": "rust developer", "num_jobs": "7"}),
        )
        .unwrap();
        assert!(rendered.text.contains("rust developer"));
        assert!(rendered.text.contains("search_jobs"));
        assert!(rendered.text.contains("top 7 positions"));
    }

    #[test]
    fn analyze_prompt_rejects_unknown_platform() {
        let err = render_prompt(
            "analyze_job_market",
            &json!({"role": "dev", "platform": "monster"}),
        )
        .unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }

    #[test]
    fn save_jobs_builds_expected_filename() {
        let rendered = render_prompt(
            "save_jobs",
            &json!({
                "jobs_dir": "/tmp/jobs",
                "date": "2026-08-07",
                "role": "Rust Developer",
                "city": "New York",
                "num_jobs": "3",
            }),
        )
        .unwrap();
        assert!(rendered
            .text
            .contains("2026-08-07_rust_developer_new_york_3.json"));
    }

    #[test]
    fn mesh_resumes_rejects_unsafe_filename() {
        let err = render_prompt(
            "mesh_resumes",
            &json!({
                "save_directory": "/tmp",
                "resume_mesh_filename": "../etc/passwd",
                "date": "2026-08-07",
            }),
        )
        .unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }

    #[test]
    fn unknown_prompt_is_rejected() {
        assert!(render_prompt("nope", &json!({})).is_err());
    }
}
