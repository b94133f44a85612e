use crate::query::{
    ast::drop_table::DropTable,
    renderer::{Render, Renderer},
};

impl Render for DropTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("DROP TABLE ");
        if self.if_exists {
            r.sql.push_str("IF EXISTS ");
        }
        r.render_table_ref(&self.table);
        r.sql.push(';');
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{common::TableRef, drop_table::DropTable},
        dialect::SqlServer,
        renderer::{Render, Renderer},
    };

    #[test]
    fn test_render_drop_table() {
        let ast = DropTable {
            table: TableRef {
                schema: Some("dbo".to_string()),
                name: "users".to_string(),
            },
            if_exists: false,
        };

        let mut renderer = Renderer::new(&SqlServer);
        ast.render(&mut renderer);
        let sql = renderer.finish();

        assert_eq!(sql, "DROP TABLE [dbo].[users];");
    }
}
