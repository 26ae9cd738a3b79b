//! Tenant directory: the static, versioned table of venues in the complex.
//!
//! Loaded once at startup (built-in table or a TOML file of the same shape)
//! and shared read-only by every role through the formatted preamble.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::weather::Condition;

/// Version tag of the built-in table.
pub const BUILTIN_DIRECTORY_VERSION: &str = "takeshiba-2024.1";

/// A single tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    /// Cuisine or trade, e.g. "フレンチ", "映画館". The directory group
    /// ("restaurants", "shops") is the enclosing `DirectorySection::key`.
    #[serde(alias = "category")]
    pub kind: String,
    /// Floor label as printed in the building guide ("B1F", "1F-2F", "屋上").
    pub floor: String,
    /// Conditions under which this venue is a good pick.
    #[serde(default)]
    pub weather_preference: Vec<Condition>,
    pub description: String,
}

impl Venue {
    pub fn suits(&self, condition: Condition) -> bool {
        self.weather_preference.contains(&condition)
    }
}

/// Named group of venues ("restaurants", "shops", "entertainment").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySection {
    pub key: String,
    #[serde(default)]
    pub venues: Vec<Venue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantDirectory {
    pub version: String,
    #[serde(default)]
    pub sections: Vec<DirectorySection>,
}

impl TenantDirectory {
    /// The built-in Takeshiba Port City table.
    pub fn takeshiba() -> Self {
        use Condition::*;

        let restaurants = vec![
            venue(
                "レストラン・ボンマルシェ",
                "フレンチ",
                "2F",
                &[Sunny, Cloudy],
                "本格フレンチレストラン。晴れの日のランチがおすすめ",
            ),
            venue(
                "和食処 海鮮",
                "和食",
                "1F",
                &[Rainy, Cloudy],
                "新鮮な海鮮料理。雨の日でも快適に過ごせる",
            ),
            venue(
                "カフェ・オーシャンビュー",
                "カフェ",
                "3F",
                &[Sunny],
                "海を眺めながらコーヒーを楽しめる。晴れの日は絶景",
            ),
            venue(
                "ラーメン横丁",
                "ラーメン",
                "B1F",
                &[Rainy, Cold],
                "雨の日や寒い日に温まるラーメン店",
            ),
        ];
        let shops = vec![
            venue(
                "ファッションプラザ",
                "アパレル",
                "1F-2F",
                &[Rainy, Cloudy],
                "雨の日のショッピングに最適",
            ),
            venue(
                "スポーツショップ アクティブ",
                "スポーツ用品",
                "3F",
                &[Sunny],
                "アウトドア用品も充実。晴れの日の外出準備に",
            ),
            venue(
                "本とカフェの店",
                "書店・カフェ",
                "2F",
                &[Rainy, Cloudy],
                "雨の日はゆっくり読書を楽しめる",
            ),
        ];
        let entertainment = vec![
            venue(
                "シネマコンプレックス",
                "映画館",
                "4F",
                &[Rainy, Cloudy],
                "雨の日の定番エンターテイメント",
            ),
            venue(
                "ゲームセンター",
                "アミューズメント",
                "3F",
                &[Rainy, Cloudy],
                "天気に関係なく楽しめる",
            ),
            venue(
                "展望デッキ",
                "観光",
                "屋上",
                &[Sunny, Clear],
                "晴れの日は東京湾の絶景を楽しめる",
            ),
        ];

        Self {
            version: BUILTIN_DIRECTORY_VERSION.to_string(),
            sections: vec![
                DirectorySection {
                    key: "restaurants".into(),
                    venues: restaurants,
                },
                DirectorySection {
                    key: "shops".into(),
                    venues: shops,
                },
                DirectorySection {
                    key: "entertainment".into(),
                    venues: entertainment,
                },
            ],
        }
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let directory: Self = toml::from_str(raw).context("invalid tenant directory TOML")?;
        if directory.is_empty() {
            anyhow::bail!("tenant directory `{}` has no venues", directory.version);
        }
        Ok(directory)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tenant directory {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    pub fn venues(&self) -> impl Iterator<Item = &Venue> {
        self.sections.iter().flat_map(|s| s.venues.iter())
    }

    pub fn len(&self) -> usize {
        self.venues().count()
    }

    pub fn is_empty(&self) -> bool {
        self.venues().next().is_none()
    }

    /// Venues whose weather affinity includes `condition`, in table order.
    pub fn suited_to(&self, condition: Condition) -> Vec<&Venue> {
        self.venues().filter(|v| v.suits(condition)).collect()
    }

    /// Render the directory grouped by section, one entry per venue with
    /// name, kind, floor, weather affinity and description.
    pub fn format(&self) -> String {
        let mut out = format!("=== Takeshiba Port City tenants ({}) ===\n", self.version);
        for section in &self.sections {
            out.push_str(&format!("\n[{}]\n", section.key));
            for v in &section.venues {
                let affinity = if v.weather_preference.is_empty() {
                    "any".to_string()
                } else {
                    v.weather_preference
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                out.push_str(&format!(
                    "- {} [{}] ({}) weather: {}\n  {}\n",
                    v.name, v.kind, v.floor, affinity, v.description
                ));
            }
        }
        out
    }
}

fn venue(
    name: &str,
    kind: &str,
    floor: &str,
    weather_preference: &[Condition],
    description: &str,
) -> Venue {
    Venue {
        name: name.to_string(),
        kind: kind.to_string(),
        floor: floor.to_string(),
        weather_preference: weather_preference.to_vec(),
        description: description.to_string(),
    }
}
