use crate::query::{
    ast::truncate::TruncateTable,
    renderer::{Render, Renderer},
};

impl Render for TruncateTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("TRUNCATE TABLE ");
        r.render_table_ref(&self.table);
        r.sql.push(';');
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{ast::truncate::TruncateTable, dialect::SqlServer, renderer::to_sql},
        table_ref,
    };

    #[test]
    fn test_render_truncate() {
        let ast = TruncateTable {
            table: table_ref!("events"),
        };
        assert_eq!(to_sql(&ast, &SqlServer), "TRUNCATE TABLE [events];");
    }
}
