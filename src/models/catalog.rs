use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutritions {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub sugar: Option<f64>,
    #[serde(default)]
    pub carbohydrates: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fruit {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub nutritions: Nutritions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(alias = "nama")]
    pub name: String,
}
