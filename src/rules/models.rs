use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Format: "projects/{project-id}/releases/{release-id}"
    pub name: String,
    /// Format: "projects/{project-id}/rulesets/{ruleset-id}"
    #[serde(default)]
    pub ruleset_name: String,
    pub update_time: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListReleasesResponse {
    #[serde(default)]
    pub releases: Vec<Release>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    pub name: String,
    pub source: Option<Source>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Source {
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SourceFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}
