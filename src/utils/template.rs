//! String template rendering utilities.

pub struct TemplateVars;

impl TemplateVars {
    pub const RELEASE_PATH: &'static str = "releasePath";
    pub const CONNECTION: &'static str = "connection";
    pub const STAGE: &'static str = "stage";
    pub const TASK: &'static str = "task";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}
