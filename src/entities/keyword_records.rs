use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "keyword_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// JSON array of sanitized keywords, in the order they were entered.
    pub keywords: String,

    pub image_url: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
