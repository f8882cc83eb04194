use std::collections::HashMap;
use std::io::Write;

use log::debug;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::passes::{PassManager, PassManagerBuilder};
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, StructType};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue, IntValue, PointerValue,
};
use inkwell::{AddressSpace, IntPredicate, OptimizationLevel};

use crate::compiler::ast::{
    Block, Condition, CompareOp, DataType, Dim, Expression, FunctionCall, FunctionDef, LValue,
    LValueKind, LocalDef, LogicOp, PassMode, Program, ScalarKind, Statement, UnaryOp, BinaryOp,
};
use crate::compiler::error::{CompileError, ErrorKind, Warning};
use crate::compiler::runtime;
use crate::compiler::source::SourceIr;

use super::stringpool::StringPool;
use super::CodegenError;

/// Lowering context for the function currently being generated.
struct FnCtx<'ctx> {
    fn_val: FunctionValue<'ctx>,
    frame_ptr: PointerValue<'ctx>,
    ret: ScalarKind,
    is_program: bool,
}

/// One code generation session: owns the module and builder for a single
/// compilation, borrowing the driver-created LLVM context.  Create a fresh
/// context and `IrGen` per compilation to compile many inputs in one
/// process.
pub struct IrGen<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    machine: TargetMachine,
    frames: HashMap<String, StructType<'ctx>>,
    functions: HashMap<String, FunctionValue<'ctx>>,
    strings: StringPool<'ctx>,
    warnings: Vec<Warning>,
}

impl<'ctx> IrGen<'ctx> {
    pub fn new(context: &'ctx Context, name: &str) -> Result<IrGen<'ctx>, CompileError> {
        Target::initialize_all(&InitializationConfig::default());
        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple)
            .map_err(|e| CompileError::internal(format!("cannot resolve target: {}", e)))?;
        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| CompileError::internal("could not create a target machine"))?;

        let module = context.create_module(name);
        module.set_triple(&triple);
        module.set_data_layout(&machine.get_target_data().get_data_layout());

        Ok(IrGen {
            context,
            module,
            builder: context.create_builder(),
            machine,
            frames: HashMap::new(),
            functions: HashMap::new(),
            strings: StringPool::new(),
            warnings: Vec::new(),
        })
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Lower the whole program: declare the runtime library, run the
    /// frame-type pass, then the function-body pass.
    pub fn ingest(&mut self, program: &Program) -> Result<(), CompileError> {
        debug!("lowering program {}", program.main.header.name);
        self.declare_runtime();
        self.declare_frames(&program.main, None)?;
        self.gen_function(&program.main)
    }

    /// Run the module through the fixed optimization pipeline:
    /// inter-procedural inlining, the scalar set, then vectorization.
    pub fn optimize(&self) {
        let pmb = PassManagerBuilder::create();
        pmb.set_optimization_level(OptimizationLevel::Aggressive);

        let pm: PassManager<Module<'ctx>> = PassManager::create(());
        pm.add_function_inlining_pass();
        pm.add_promote_memory_to_register_pass();
        pm.add_instruction_combining_pass();
        pm.add_reassociate_pass();
        pm.add_gvn_pass();
        pm.add_cfg_simplification_pass();
        pm.add_loop_vectorize_pass();
        pm.add_slp_vectorize_pass();
        pmb.populate_module_pass_manager(&pm);

        pm.run_on(&self.module);
    }

    /// Structural integrity check over the finished module; runs whether or
    /// not optimization did.
    pub fn verify(&self) -> Result<(), CompileError> {
        self.module.verify().map_err(|e| {
            CompileError::internal(format!("module verification failed: {}", e.to_string()))
        })
    }

    /// The textual intermediate listing.
    pub fn write_ir(&self, sink: &mut dyn Write) -> Result<(), String> {
        sink.write_all(self.module.print_to_string().to_string().as_bytes())
            .map_err(|e| e.to_string())
    }

    pub fn write_assembly(&self, sink: &mut dyn Write) -> Result<(), String> {
        let buf = self
            .machine
            .write_to_memory_buffer(&self.module, FileType::Assembly)
            .map_err(|e| e.to_string())?;
        sink.write_all(buf.as_slice()).map_err(|e| e.to_string())
    }

    pub fn write_object(&self, sink: &mut dyn Write) -> Result<(), String> {
        let buf = self
            .machine
            .write_to_memory_buffer(&self.module, FileType::Object)
            .map_err(|e| e.to_string())?;
        sink.write_all(buf.as_slice()).map_err(|e| e.to_string())
    }

    fn scalar_type(&self, k: ScalarKind) -> BasicTypeEnum<'ctx> {
        match k {
            ScalarKind::Int => self.context.i64_type().into(),
            ScalarKind::Char => self.context.i8_type().into(),
            ScalarKind::Nothing => unreachable!("nothing is not a data type"),
        }
    }

    fn array_type(&self, elem: ScalarKind, dims: &[Dim]) -> BasicTypeEnum<'ctx> {
        let mut ty = self.scalar_type(elem);
        for d in dims.iter().rev() {
            let n = match d {
                Dim::Fixed(n) => *n as u32,
                Dim::Unspecified => unreachable!("unspecified dimension in a concrete array type"),
            };
            ty = ty.array_type(n).into();
        }
        ty
    }

    fn data_type(&self, ty: &DataType) -> BasicTypeEnum<'ctx> {
        match ty {
            DataType::Scalar(k) => self.scalar_type(*k),
            DataType::Array { elem, dims } => self.array_type(*elem, dims),
        }
    }

    /// The physical type a parameter occupies in its frame slot and in the
    /// argument list.
    fn param_type(&self, ty: &DataType, mode: PassMode) -> BasicTypeEnum<'ctx> {
        match (mode, ty) {
            (PassMode::ByValue, DataType::Scalar(k)) => self.scalar_type(*k),
            (PassMode::ByReference, DataType::Scalar(k)) => self
                .scalar_type(*k)
                .ptr_type(AddressSpace::default())
                .into(),
            (_, DataType::Array { elem, dims }) => {
                // An unspecified leading dimension is stripped; the callee
                // sees a pointer to the remaining sub-array (or element).
                let pointee = if matches!(dims.first(), Some(Dim::Unspecified)) {
                    if dims.len() == 1 {
                        self.scalar_type(*elem)
                    } else {
                        self.array_type(*elem, &dims[1..])
                    }
                } else {
                    self.array_type(*elem, dims)
                };
                pointee.ptr_type(AddressSpace::default()).into()
            }
        }
    }

    fn declare_runtime(&mut self) {
        for rf in runtime::catalog() {
            let params: Vec<BasicMetadataTypeEnum> = rf
                .params
                .iter()
                .map(|(_, ty, mode)| self.param_type(ty, *mode).into())
                .collect();
            let fn_ty = match rf.ret {
                ScalarKind::Nothing => self.context.void_type().fn_type(&params, false),
                k => self.scalar_type(k).fn_type(&params, false),
            };
            let f = self.module.add_function(rf.name, fn_ty, None);
            self.functions.insert(rf.name.to_string(), f);
        }
    }

    /// Frame-type pass: one named record type per function, program
    /// function first, then its nested functions recursively.  The record
    /// holds the static link (nested functions only), then the parameters,
    /// then the locals, in declaration order.  Function declarations are
    /// added here too so every later call site can resolve its callee.
    fn declare_frames(
        &mut self,
        def: &FunctionDef,
        parent_frame: Option<StructType<'ctx>>,
    ) -> Result<(), CompileError> {
        let qualified = def.qualified_name();
        let frame_ty = self.context.opaque_struct_type(&format!("frame.{}", qualified));

        let mut fields: Vec<BasicTypeEnum> = vec![];
        if let Some(parent) = parent_frame {
            fields.push(parent.ptr_type(AddressSpace::default()).into());
        }
        for p in &def.header.params {
            fields.push(self.param_type(&p.ty, p.mode));
        }
        for local in &def.locals {
            if let LocalDef::Var(v) = local {
                fields.push(self.data_type(&v.ty));
            }
        }
        frame_ty.set_body(&fields, false);
        self.frames.insert(qualified.clone(), frame_ty);

        let mut param_tys: Vec<BasicMetadataTypeEnum> = vec![];
        if let Some(parent) = parent_frame {
            param_tys.push(parent.ptr_type(AddressSpace::default()).into());
        }
        for p in &def.header.params {
            param_tys.push(self.param_type(&p.ty, p.mode).into());
        }

        let fn_ty = if def.is_program() {
            // The program function is the OS entry point.
            self.context.i32_type().fn_type(&param_tys, false)
        } else {
            match def.header.ret {
                ScalarKind::Nothing => self.context.void_type().fn_type(&param_tys, false),
                k => self.scalar_type(k).fn_type(&param_tys, false),
            }
        };
        let symbol = if def.is_program() {
            "main".to_string()
        } else {
            qualified.clone()
        };
        let fn_val = self.module.add_function(&symbol, fn_ty, None);
        self.functions.insert(qualified, fn_val);

        for local in &def.locals {
            if let LocalDef::Func(nested) = local {
                self.declare_frames(nested, Some(frame_ty))?;
            }
        }
        Ok(())
    }

    /// Function-body pass.  The generated function allocates its frame on
    /// the entry block and copies every incoming argument (static link
    /// included) into its slot; all later accesses go through the frame.
    fn gen_function(&mut self, def: &FunctionDef) -> Result<(), CompileError> {
        let qualified = def.qualified_name();
        debug!("lowering function {}", qualified);
        let fn_val = *self
            .functions
            .get(&qualified)
            .ok_or_else(|| CompileError::internal(format!("no declaration for {}", qualified)))?;
        let frame_ty = *self
            .frames
            .get(&qualified)
            .ok_or_else(|| CompileError::internal(format!("no frame type for {}", qualified)))?;

        let entry = self.context.append_basic_block(fn_val, "entry");
        self.builder.position_at_end(entry);
        let frame_ptr = self.builder.build_alloca(frame_ty, "frame");
        for (i, arg) in fn_val.get_params().iter().enumerate() {
            let slot = self.struct_slot(frame_ptr, i)?;
            self.builder.build_store(slot, *arg);
        }

        // Nested functions are lowered before the body so their call sites
        // inside the body refer to finished definitions.
        for local in &def.locals {
            if let LocalDef::Func(nested) = local {
                self.gen_function(nested)?;
            }
        }

        self.builder.position_at_end(entry);
        let ctx = FnCtx {
            fn_val,
            frame_ptr,
            ret: def.header.ret,
            is_program: def.is_program(),
        };
        self.gen_block(&ctx, &def.body)?;

        if !self.block_terminated() {
            if ctx.is_program {
                self.emit_dummy_return(&ctx);
            } else if ctx.ret == ScalarKind::Nothing {
                self.builder.build_return(None);
            } else {
                return Err(CompileError::new(
                    def.body.span,
                    ErrorKind::Codegen(CodegenError::MissingReturn(def.header.name.clone())),
                ));
            }
        }
        Ok(())
    }

    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_some()
    }

    fn struct_slot(
        &self,
        ptr: PointerValue<'ctx>,
        index: usize,
    ) -> Result<PointerValue<'ctx>, CompileError> {
        self.builder
            .build_struct_gep(ptr, index as u32, "")
            .map_err(|_| CompileError::internal(format!("frame has no slot {}", index)))
    }

    /// Walk `hops` static links starting from the current frame.
    fn walk_links(
        &self,
        ctx: &FnCtx<'ctx>,
        hops: usize,
    ) -> Result<PointerValue<'ctx>, CompileError> {
        let mut ptr = ctx.frame_ptr;
        for _ in 0..hops {
            let link = self.struct_slot(ptr, 0)?;
            ptr = self.builder.build_load(link, "").into_pointer_value();
        }
        Ok(ptr)
    }

    fn gen_block(&mut self, ctx: &FnCtx<'ctx>, block: &Block) -> Result<(), CompileError> {
        for stmt in &block.statements {
            if self.block_terminated() {
                self.warnings.push(Warning {
                    span: stmt.span(),
                    message: "unreachable code".into(),
                });
                break;
            }
            self.gen_statement(ctx, stmt)?;
        }
        Ok(())
    }

    fn gen_statement(&mut self, ctx: &FnCtx<'ctx>, stmt: &Statement) -> Result<(), CompileError> {
        match stmt {
            Statement::Empty(_) => Ok(()),
            Statement::Assign { target, value, .. } => {
                let ptr = self.gen_lvalue_ptr(ctx, target)?;
                let v = self.gen_expr(ctx, value)?;
                self.builder.build_store(ptr, v);
                Ok(())
            }
            Statement::Block(b) => self.gen_block(ctx, b),
            Statement::Call(call) => {
                self.gen_call(ctx, call)?;
                Ok(())
            }
            Statement::If {
                cond,
                then_stmt,
                else_stmt,
                ..
            } => self.gen_if(ctx, cond, then_stmt, else_stmt.as_deref()),
            Statement::While { cond, body, .. } => self.gen_while(ctx, cond, body),
            Statement::Return { value, .. } => self.gen_return(ctx, value),
        }
    }

    fn emit_dummy_return(&self, ctx: &FnCtx<'ctx>) {
        if ctx.is_program {
            let zero = self.context.i32_type().const_int(0, false);
            self.builder.build_return(Some(&zero));
        } else {
            match ctx.ret {
                ScalarKind::Nothing => self.builder.build_return(None),
                ScalarKind::Int => {
                    let zero = self.context.i64_type().const_int(0, false);
                    self.builder.build_return(Some(&zero))
                }
                ScalarKind::Char => {
                    let zero = self.context.i8_type().const_int(0, false);
                    self.builder.build_return(Some(&zero))
                }
            };
        }
    }

    fn gen_return(
        &mut self,
        ctx: &FnCtx<'ctx>,
        value: &Option<Expression>,
    ) -> Result<(), CompileError> {
        match value {
            None => {
                self.emit_dummy_return(ctx);
                Ok(())
            }
            Some(e) => {
                // A call to a nothing-returning function is a legal return
                // payload; the call happens, then a bare return.
                if let Expression::Call(call) = e {
                    let ret = call
                        .resolved
                        .as_ref()
                        .map(|r| r.ret)
                        .ok_or_else(|| CompileError::internal("call missing resolution"))?;
                    if ret == ScalarKind::Nothing {
                        self.gen_call(ctx, call)?;
                        self.emit_dummy_return(ctx);
                        return Ok(());
                    }
                }
                let v = self.gen_expr(ctx, e)?;
                self.builder.build_return(Some(&v));
                Ok(())
            }
        }
    }

    fn gen_if(
        &mut self,
        ctx: &FnCtx<'ctx>,
        cond: &Condition,
        then_stmt: &Statement,
        else_stmt: Option<&Statement>,
    ) -> Result<(), CompileError> {
        let cond_val = self.gen_cond(ctx, cond)?;
        let then_bb = self.context.append_basic_block(ctx.fn_val, "then");

        match else_stmt {
            Some(els) => {
                let else_bb = self.context.append_basic_block(ctx.fn_val, "else");
                let merge_bb = self.context.append_basic_block(ctx.fn_val, "merge");
                self.builder
                    .build_conditional_branch(cond_val, then_bb, else_bb);

                self.builder.position_at_end(then_bb);
                self.gen_statement(ctx, then_stmt)?;
                let then_done = self.block_terminated();
                if !then_done {
                    self.builder.build_unconditional_branch(merge_bb);
                }

                self.builder.position_at_end(else_bb);
                self.gen_statement(ctx, els)?;
                let else_done = self.block_terminated();
                if !else_done {
                    self.builder.build_unconditional_branch(merge_bb);
                }

                self.builder.position_at_end(merge_bb);
                if then_done && else_done {
                    // Both arms returned; the merge block is unreachable
                    // but still needs a terminator for well-formedness.
                    self.emit_dummy_return(ctx);
                }
                Ok(())
            }
            None => {
                let merge_bb = self.context.append_basic_block(ctx.fn_val, "merge");
                self.builder
                    .build_conditional_branch(cond_val, then_bb, merge_bb);

                self.builder.position_at_end(then_bb);
                self.gen_statement(ctx, then_stmt)?;
                if !self.block_terminated() {
                    self.builder.build_unconditional_branch(merge_bb);
                }

                self.builder.position_at_end(merge_bb);
                Ok(())
            }
        }
    }

    fn gen_while(
        &mut self,
        ctx: &FnCtx<'ctx>,
        cond: &Condition,
        body: &Statement,
    ) -> Result<(), CompileError> {
        let cond_bb = self.context.append_basic_block(ctx.fn_val, "while_cond");
        let body_bb = self.context.append_basic_block(ctx.fn_val, "while_body");
        let merge_bb = self.context.append_basic_block(ctx.fn_val, "while_end");

        self.builder.build_unconditional_branch(cond_bb);
        self.builder.position_at_end(cond_bb);
        let cond_val = self.gen_cond(ctx, cond)?;
        self.builder
            .build_conditional_branch(cond_val, body_bb, merge_bb);

        self.builder.position_at_end(body_bb);
        self.gen_statement(ctx, body)?;
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(cond_bb);
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn gen_cond(
        &mut self,
        ctx: &FnCtx<'ctx>,
        cond: &Condition,
    ) -> Result<IntValue<'ctx>, CompileError> {
        match cond {
            Condition::Compare {
                op, left, right, ..
            } => {
                let l = self.gen_expr(ctx, left)?.into_int_value();
                let r = self.gen_expr(ctx, right)?.into_int_value();
                let pred = match op {
                    CompareOp::Eq => IntPredicate::EQ,
                    CompareOp::Neq => IntPredicate::NE,
                    CompareOp::Lt => IntPredicate::SLT,
                    CompareOp::Gt => IntPredicate::SGT,
                    CompareOp::Le => IntPredicate::SLE,
                    CompareOp::Ge => IntPredicate::SGE,
                };
                Ok(self.builder.build_int_compare(pred, l, r, "cmp"))
            }
            Condition::Not { operand, .. } => {
                let v = self.gen_cond(ctx, operand)?;
                Ok(self.builder.build_not(v, "not"))
            }
            Condition::Logic {
                op, left, right, ..
            } => {
                // Short-circuit diamond.  The phi records the final block
                // each side ended in, not the block it started in, because
                // nested connectives create more blocks along the way.
                let lhs = self.gen_cond(ctx, left)?;
                let lhs_end = self.current_block()?;
                let rhs_bb = self.context.append_basic_block(ctx.fn_val, "sc_rhs");
                let merge_bb = self.context.append_basic_block(ctx.fn_val, "sc_merge");
                match op {
                    LogicOp::And => {
                        self.builder.build_conditional_branch(lhs, rhs_bb, merge_bb)
                    }
                    LogicOp::Or => {
                        self.builder.build_conditional_branch(lhs, merge_bb, rhs_bb)
                    }
                };

                self.builder.position_at_end(rhs_bb);
                let rhs = self.gen_cond(ctx, right)?;
                let rhs_end = self.current_block()?;
                self.builder.build_unconditional_branch(merge_bb);

                self.builder.position_at_end(merge_bb);
                let phi = self.builder.build_phi(self.context.bool_type(), "sc");
                phi.add_incoming(&[
                    (&lhs as &dyn BasicValue, lhs_end),
                    (&rhs as &dyn BasicValue, rhs_end),
                ]);
                Ok(phi.as_basic_value().into_int_value())
            }
        }
    }

    fn current_block(&self) -> Result<BasicBlock<'ctx>, CompileError> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| CompileError::internal("builder is not positioned in a block"))
    }

    fn gen_expr(
        &mut self,
        ctx: &FnCtx<'ctx>,
        e: &Expression,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        match e {
            Expression::IntLit(v, _) => {
                Ok(self.context.i64_type().const_int(*v as u64, true).into())
            }
            Expression::CharLit(c, _) => {
                Ok(self.context.i8_type().const_int(*c as u64, false).into())
            }
            Expression::LValue(lv) => {
                let ptr = self.gen_lvalue_ptr(ctx, lv)?;
                Ok(self.builder.build_load(ptr, ""))
            }
            Expression::Call(call) => self
                .gen_call(ctx, call)?
                .ok_or_else(|| CompileError::internal("nothing-returning call used as a value")),
            Expression::Unary { op, operand, .. } => {
                let v = self.gen_expr(ctx, operand)?.into_int_value();
                Ok(match op {
                    UnaryOp::Plus => v.into(),
                    UnaryOp::Minus => self.builder.build_int_neg(v, "neg").into(),
                })
            }
            Expression::Binary {
                op, left, right, ..
            } => {
                let l = self.gen_expr(ctx, left)?.into_int_value();
                let r = self.gen_expr(ctx, right)?.into_int_value();
                let v = match op {
                    BinaryOp::Add => self.builder.build_int_add(l, r, ""),
                    BinaryOp::Sub => self.builder.build_int_sub(l, r, ""),
                    BinaryOp::Mul => self.builder.build_int_mul(l, r, ""),
                    BinaryOp::Div => self.builder.build_int_signed_div(l, r, ""),
                    BinaryOp::Mod => self.builder.build_int_signed_rem(l, r, ""),
                };
                Ok(v.into())
            }
        }
    }

    /// A pointer to the storage an l-value denotes: the frame slot for
    /// variables (after walking static links), the pointed-to storage for
    /// reference parameters, the pooled global for string literals, and
    /// the element (or sub-array) for indexed accesses.
    fn gen_lvalue_ptr(
        &mut self,
        ctx: &FnCtx<'ctx>,
        lv: &LValue,
    ) -> Result<PointerValue<'ctx>, CompileError> {
        match &lv.kind {
            LValueKind::Ident(_) => {
                let st = lv
                    .storage
                    .as_ref()
                    .ok_or_else(|| CompileError::internal("l-value missing storage annotation"))?;
                let frame = self.walk_links(ctx, st.hops)?;
                let slot = self.struct_slot(frame, st.offset)?;
                if st.indirect {
                    Ok(self.builder.build_load(slot, "").into_pointer_value())
                } else {
                    Ok(slot)
                }
            }
            LValueKind::StringLit(bytes) => {
                Ok(self.strings.get_or_add(self.context, &self.module, bytes))
            }
            LValueKind::Index { base, indices } => {
                let base_ptr = self.gen_lvalue_ptr(ctx, base)?;
                let mut idx: Vec<IntValue> = vec![];
                // Bases that point at a whole array (variables,
                // fully-dimensioned reference parameters, string literals)
                // get a leading zero to descend into it first.  A decayed
                // base already points at the first sub-array or element, so
                // its first index performs the inter-element arithmetic.
                if !lvalue_is_decayed(base) {
                    idx.push(self.context.i64_type().const_int(0, false));
                }
                for e in indices {
                    idx.push(self.gen_expr(ctx, e)?.into_int_value());
                }
                Ok(unsafe { self.builder.build_in_bounds_gep(base_ptr, &idx, "elem") })
            }
        }
    }

    /// Lower a call: static link first (for nested callees), then the
    /// arguments with their pass modes.  Returns `None` for
    /// nothing-returning callees.
    fn gen_call(
        &mut self,
        ctx: &FnCtx<'ctx>,
        call: &FunctionCall,
    ) -> Result<Option<BasicValueEnum<'ctx>>, CompileError> {
        let info = call
            .resolved
            .as_ref()
            .ok_or_else(|| CompileError::internal("call missing resolution annotation"))?
            .clone();

        let key = if info.runtime {
            call.name.clone()
        } else {
            info.qualified_name(&call.name)
        };
        let callee = *self
            .functions
            .get(&key)
            .ok_or_else(|| CompileError::internal(format!("no declaration for callee {}", key)))?;

        let mut args: Vec<BasicMetadataValueEnum> = vec![];
        if !info.runtime && !info.callee_parent.is_empty() {
            let link = self.walk_links(ctx, info.link_hops())?;
            args.push(link.into());
        }

        for (arg, pass) in call.args.iter().zip(info.args.iter()) {
            match pass.mode {
                PassMode::ByValue => args.push(self.gen_expr(ctx, arg)?.into()),
                PassMode::ByReference => {
                    let lv = match arg {
                        Expression::LValue(lv) => lv,
                        _ => {
                            return Err(CompileError::internal(
                                "reference argument is not an l-value",
                            ))
                        }
                    };
                    let mut ptr = self.gen_lvalue_ptr(ctx, lv)?;
                    // Decay an array to a pointer to its first element when
                    // the parameter's leading dimension is unspecified.  An
                    // argument that already went through that decay (an
                    // unspecified-dimension parameter passed along) is
                    // forwarded unchanged.
                    if pass.decay && !lvalue_is_decayed(lv) {
                        let zero = self.context.i64_type().const_int(0, false);
                        ptr = unsafe {
                            self.builder.build_in_bounds_gep(ptr, &[zero, zero], "decay")
                        };
                    }
                    args.push(ptr.into());
                }
            }
        }

        let name = if info.ret == ScalarKind::Nothing {
            ""
        } else {
            "call"
        };
        let result = self.builder.build_call(callee, &args, name);
        Ok(result.try_as_basic_value().left())
    }
}

/// Whether an l-value denotes storage already held as a first-element
/// pointer: a reference parameter whose leading dimension is unspecified.
/// String literals and indexed accesses always point at a whole array or
/// sub-array and never count as decayed.
fn lvalue_is_decayed(lv: &LValue) -> bool {
    match &lv.kind {
        LValueKind::Ident(_) => lv.storage.as_ref().map_or(false, |s| s.decayed),
        LValueKind::StringLit(_) | LValueKind::Index { .. } => false,
    }
}
