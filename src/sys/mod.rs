use std::path::Path;

use anyhow::anyhow;

pub mod llm;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldData {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub nations: Vec<Nation>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    pub id: String,
    pub name: String,
    pub english_name: String,
    pub short_description: String,
    pub capital: String,
    pub symbol: String,
    pub landmark: Landmark,
    pub system: String,
    #[serde(default)]
    pub characteristics: Vec<String>,
    pub military: String,
    #[serde(default)]
    pub color_theme: String,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub leadership: Vec<Leader>,
    #[serde(default)]
    pub key_figures: Vec<KeyFigure>,
    #[serde(default)]
    pub key_groups: Vec<KeyGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Landmark {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Relation {
    pub target: String,
    pub relationship: String,
    #[serde(default)]
    pub description: Vec<String>,
    pub view: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Leader {
    pub title: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyFigure {
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyGroup {
    pub name: String,
    pub description: String,
}

impl WorldData {
    /// Reads the world document, as TOML when the file ends in `.toml`, JSON otherwise.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| anyhow!("world file `{}` not found", path.display()))?;

        let world: WorldData = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&raw)?,
            _ => serde_json::from_str(&raw)?,
        };
        log::info!(
            "loaded world `{}` with {} nations",
            world.title,
            world.nations.len()
        );
        Ok(world)
    }
}

#[cfg(test)]
pub(crate) fn sample_world() -> WorldData {
    serde_json::from_value(serde_json::json!({
        "title": "아렌티나 대륙",
        "description": "세 나라가 패권을 다투는 대륙",
        "nations": [{
            "id": "empire",
            "name": "아렌티나 제국",
            "englishName": "Arentina Empire",
            "shortDescription": "대륙 중앙의 제국",
            "capital": "아렌",
            "symbol": "황금 사자",
            "landmark": { "name": "황궁", "description": "제국의 심장" },
            "system": "황제정",
            "characteristics": ["강력한 중앙집권"],
            "military": "제국 기사단",
            "colorTheme": "gold",
            "relations": [{
                "target": "holy",
                "relationship": "긴장",
                "description": ["국경 분쟁"],
                "view": "이단의 땅"
            }],
            "leadership": [{ "title": "황제", "name": "레온 3세", "description": "철혈 군주" }],
            "keyFigures": [{ "name": "카엘", "role": "기사단장", "description": ["검성"] }],
            "keyGroups": [{ "name": "원로원", "description": "귀족 회의" }],
            "image": "empire.png"
        }]
    }))
    .expect("sample world")
}
