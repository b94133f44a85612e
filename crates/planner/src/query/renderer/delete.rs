use crate::query::{
    ast::delete::DeleteAll,
    renderer::{Render, Renderer},
};

impl Render for DeleteAll {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("DELETE FROM ");
        r.render_table_ref(&self.table);
        r.sql.push(';');
    }
}
