#![allow(dead_code)]

pub mod person {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "people")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub age: i64,
        pub nickname: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

use query_db::{FieldKind, FieldMap};

pub fn people_fields() -> FieldMap<person::Entity> {
    FieldMap::<person::Entity>::new()
        .insert("id", person::Column::Id, FieldKind::I64)
        .insert("name", person::Column::Name, FieldKind::String)
        .insert("age", person::Column::Age, FieldKind::I64)
        .insert("nickname", person::Column::Nickname, FieldKind::String)
        .relation("friends")
}
