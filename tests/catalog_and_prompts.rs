use jobmesh::mcp::catalog::{list_tools, validate_tool_args};
use jobmesh::mcp::prompts::{prompt_catalog, render_prompt};
use serde_json::json;

#[test]
fn tools_list_exposes_search_jobs_schema() {
    let tools = list_tools();
    assert_eq!(tools.len(), 1);
    let search = &tools[0];
    assert_eq!(search.name, "search_jobs");
    let props = search.input_schema["properties"].as_object().unwrap();
    assert!(props.contains_key("role"));
    assert!(props.contains_key("num_jobs"));
    assert!(!props.contains_key("trace_id"));
    assert_eq!(search.input_schema["required"], json!(["role"]));
}

#[test]
fn schema_rejects_wrong_types_with_stable_code() {
    let err = validate_tool_args("search_jobs", &json!({"role": 42})).unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");

    let err =
        validate_tool_args("search_jobs", &json!({"role": "dev", "num_jobs": "five"}))
            .unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");
}

#[test]
fn schema_accepts_trace_metadata() {
    let args = json!({"role": "dev", "trace_id": "t-1", "span_id": "s-1"});
    assert!(validate_tool_args("search_jobs", &args).is_ok());
}

#[test]
fn prompts_catalog_matches_renderers() {
    for prompt in prompt_catalog() {
        let mut args = serde_json::Map::new();
        for required in prompt.arguments.iter().filter(|a| a.required) {
            let value = match required.name {
                "date" => "2026-08-07",
                "resume_mesh_filename" => "resume_mesh",
                _ => "placeholder",
            };
            args.insert(required.name.to_string(), json!(value));
        }
        let rendered = render_prompt(prompt.name, &json!(args)).unwrap();
        assert!(!rendered.text.trim().is_empty(), "{}", prompt.name);
        assert_eq!(rendered.description, prompt.description);
    }
}

#[test]
fn resume_prompt_embeds_sanitized_filename() {
    let rendered = render_prompt(
        "generate_resume",
        &json!({
            "save_directory": "/tmp/resumes",
            "role": "Senior Rust Engineer",
            "company": "Acme GmbH",
            "job_description": "Build services in Rust.",
        }),
    )
    .unwrap();
    assert!(rendered.text.contains("acme_gmbh_senior_rust_engineer_resume.md"));
    assert!(rendered.text.contains("<job_description>"));
}

#[test]
fn cover_letter_prompt_addresses_company() {
    let rendered = render_prompt(
        "generate_cover_letter",
        &json!({
            "save_directory": "/tmp",
            "role": "Rust Engineer",
            "company": "Acme",
            "job_description": "Write Rust.",
        }),
    )
    .unwrap();
    assert!(rendered.text.contains("`Rust Engineer` position at `Acme`"));
    assert!(rendered.text.contains("cover_letter.md"));
}
