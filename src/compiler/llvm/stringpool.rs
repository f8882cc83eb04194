use std::collections::HashMap;

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::PointerValue;

/// Global constants backing string literals.  Each distinct literal is
/// emitted once as a NUL-terminated character array and reused on every
/// later occurrence.
pub struct StringPool<'ctx> {
    pool: HashMap<Vec<u8>, PointerValue<'ctx>>,
}

impl<'ctx> StringPool<'ctx> {
    pub fn new() -> StringPool<'ctx> {
        StringPool {
            pool: HashMap::new(),
        }
    }

    pub fn get_or_add(
        &mut self,
        context: &'ctx Context,
        module: &Module<'ctx>,
        bytes: &[u8],
    ) -> PointerValue<'ctx> {
        if let Some(p) = self.pool.get(bytes) {
            return *p;
        }
        let name = format!("str.{}", self.pool.len());
        let ty = context.i8_type().array_type(bytes.len() as u32 + 1);
        let g = module.add_global(ty, None, &name);
        g.set_initializer(&context.const_string(bytes, true));
        g.set_constant(true);
        let p = g.as_pointer_value();
        self.pool.insert(bytes.to_vec(), p);
        p
    }
}
