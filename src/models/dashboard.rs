use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub name: String,
    pub display_name: String,
    pub project: String,
    pub datasource: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub panel_groups: Vec<PanelGroup>,
}

/// A dashboard template variable populated from label values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub display_name: String,
    pub label: String,
    /// Series selector the label values are read from.
    pub matcher_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelGroup {
    pub title: String,
    #[serde(default)]
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub queries: Vec<PanelQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelQuery {
    pub expr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
}

fn default_unit() -> String {
    "short".to_string()
}

impl Dashboard {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        project: impl Into<String>,
        datasource: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            project: project.into(),
            datasource: datasource.into(),
            variables: Vec::new(),
            panel_groups: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_group(mut self, group: PanelGroup) -> Self {
        self.panel_groups.push(group);
        self
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panel_groups.iter().flat_map(|g| g.panels.iter())
    }

    pub fn queries(&self) -> impl Iterator<Item = &PanelQuery> {
        self.panels().flat_map(|p| p.queries.iter())
    }
}

impl PanelGroup {
    pub fn new(title: impl Into<String>, panels: Vec<Panel>) -> Self {
        Self {
            title: title.into(),
            panels,
        }
    }
}

impl Panel {
    pub fn new(title: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            unit: unit.into(),
            queries: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn query(mut self, expr: String, legend: Option<&str>) -> Self {
        self.queries.push(PanelQuery {
            expr,
            legend: legend.map(str::to_string),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_serializes_nested_panels() {
        let dashboard = Dashboard::new("k8s", "Kubernetes", "monitoring", "prometheus").with_group(
            PanelGroup::new(
                "CPU",
                vec![Panel::new("Usage", "percent").query("up".to_string(), Some("{{pod}}"))],
            ),
        );
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["panel_groups"][0]["panels"][0]["queries"][0]["legend"], "{{pod}}");
        assert_eq!(dashboard.queries().count(), 1);
    }

    #[test]
    fn test_panel_defaults_when_deserializing() {
        let panel: Panel =
            serde_json::from_str(r#"{"title":"x","queries":[{"expr":"up"}]}"#).unwrap();
        assert_eq!(panel.unit, "short");
        assert!(panel.description.is_empty());
        assert!(panel.queries[0].legend.is_none());
    }
}
