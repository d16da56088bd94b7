use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct House {
    pub id: i64,
    pub name: String,
}
