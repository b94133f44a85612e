use crate::query::{
    ast::create_table::{ColumnDef, CreateTable},
    renderer::{Render, Renderer},
};

impl Render for CreateTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE TABLE ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");

        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            col.render(r);
        }

        r.sql.push_str(");");
    }
}

impl Render for ColumnDef {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&r.dialect.quote_identifier(&self.name));
        r.sql.push(' ');
        r.sql
            .push_str(&r.dialect.render_data_type(&self.data_type, &self.modifier));

        if self.is_nullable {
            r.sql.push_str(" NULL");
        } else {
            r.sql.push_str(" NOT NULL");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{
            ast::create_table::{StringLength, TypeModifier},
            builder::create_table::CreateTableBuilder,
            dialect::SqlServer,
            renderer::to_sql,
        },
        table_ref,
    };
    use model::core::data_type::SqlType;

    #[test]
    fn test_render_create_table() {
        let ast = CreateTableBuilder::new(table_ref!("dbo", "people"))
            .column("id", SqlType::BigInt, TypeModifier::None)
            .column(
                "name",
                SqlType::NVarChar,
                TypeModifier::Length(StringLength::Bounded(40)),
            )
            .column(
                "balance",
                SqlType::Decimal,
                TypeModifier::Precision {
                    precision: 10,
                    scale: 2,
                },
            )
            .build();

        assert_eq!(
            to_sql(&ast, &SqlServer),
            "CREATE TABLE [dbo].[people] ([id] BIGINT NULL, [name] NVARCHAR(40) NULL, \
             [balance] DECIMAL(10,2) NULL);"
        );
    }
}
