use crate::query::{
    ast::reseed::ReseedIdentity,
    renderer::{Render, Renderer, quoted_table},
};

impl Render for ReseedIdentity {
    fn render(&self, r: &mut Renderer) {
        let table = quoted_table(r.dialect, &self.table);
        r.sql.push_str("DBCC CHECKIDENT (");
        r.sql.push_str(&r.dialect.quote_literal(&table));
        r.sql.push_str(", RESEED, ");
        r.sql.push_str(&self.new_seed.to_string());
        r.sql.push_str(");");
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        query::{ast::reseed::ReseedIdentity, dialect::SqlServer, renderer::to_sql},
        table_ref,
    };

    #[test]
    fn test_render_reseed() {
        let ast = ReseedIdentity {
            table: table_ref!("dbo", "o'rders"),
            new_seed: 0,
        };
        assert_eq!(
            to_sql(&ast, &SqlServer),
            "DBCC CHECKIDENT ('[dbo].[o''rders]', RESEED, 0);"
        );
    }
}
