use paw::Backend;
use paw_mono::MonoDatabase;
use paw_type_checker::typed_context::TypedContext;

/// Parses, links and type-checks an in-memory program.
pub(crate) fn check(source: &str) -> TypedContext {
    paw::check_source(source).expect("pipeline should succeed")
}

pub(crate) fn try_check(source: &str) -> anyhow::Result<TypedContext> {
    paw::check_source(source)
}

/// Runs the pipeline through the monomorphization collector.
pub(crate) fn collect(source: &str) -> (TypedContext, MonoDatabase) {
    let ctx = check(source);
    let db = paw::collect_instances(&ctx);
    (ctx, db)
}

/// Full pipeline to a C translation unit.
pub(crate) fn c_codegen(source: &str) -> String {
    paw::compile_source(source, Backend::C).expect("C codegen should succeed")
}

/// Full pipeline to textual LLVM IR.
pub(crate) fn llvm_codegen(source: &str) -> String {
    paw::compile_source(source, Backend::Llvm).expect("LLVM codegen should succeed")
}

/// Number of non-overlapping occurrences of `needle` in `haystack`.
pub(crate) fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
