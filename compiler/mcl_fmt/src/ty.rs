//! Renders [`TypeAst`] back to the source-written annotation grammar
//!, the write-side counterpart to `mcl_parse::ty::parse_type_ast`.

use mcl_ir::{StringInterner, TypeAst};

pub fn format_type_ast(ty: &TypeAst, interner: &StringInterner) -> String {
    let mut out = String::new();
    write_type_ast(&mut out, ty, interner);
    out
}

fn write_type_ast(out: &mut String, ty: &TypeAst, interner: &StringInterner) {
    match ty {
        TypeAst::Bool => out.push_str("bool"),
        TypeAst::Str => out.push_str("str"),
        TypeAst::Int => out.push_str("int"),
        TypeAst::Float => out.push_str("float"),
        TypeAst::Variant => out.push_str("variant"),
        TypeAst::UnificationVar(n) => {
            out.push('?');
            out.push_str(&n.to_string());
        }
        TypeAst::List(elem) => {
            out.push_str("[]");
            write_type_ast(out, elem, interner);
        }
        TypeAst::Map(key, val) => {
            out.push_str("map{");
            write_type_ast(out, key, interner);
            out.push_str(": ");
            write_type_ast(out, val, interner);
            out.push('}');
        }
        TypeAst::Struct(fields) => {
            out.push_str("struct{");
            for (i, (name, ty)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                out.push_str(interner.resolve(*name));
                out.push(' ');
                write_type_ast(out, ty, interner);
            }
            out.push('}');
        }
        TypeAst::Func(args, ret) => {
            out.push_str("func(");
            for (i, (name, ty)) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(interner.resolve(*name));
                out.push(' ');
                write_type_ast(out, ty, interner);
            }
            out.push(')');
            out.push(' ');
            write_type_ast(out, ret, interner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The type-grammar round-trip property (`parse_type(str(t)) == t`)
    // is exercised end-to-end in `mclc`'s
    // integration tests, where a `Cursor` is already available to drive
    // `mcl_parse::parse_type_ast`.

    #[test]
    fn formats_scalar_types() {
        let interner = StringInterner::new();
        assert_eq!(format_type_ast(&TypeAst::Bool, &interner), "bool");
        assert_eq!(format_type_ast(&TypeAst::Int, &interner), "int");
    }

    #[test]
    fn formats_list_type() {
        let interner = StringInterner::new();
        let ty = TypeAst::List(Box::new(TypeAst::Str));
        assert_eq!(format_type_ast(&ty, &interner), "[]str");
    }

    #[test]
    fn formats_map_type() {
        let interner = StringInterner::new();
        let ty = TypeAst::Map(Box::new(TypeAst::Str), Box::new(TypeAst::Int));
        assert_eq!(format_type_ast(&ty, &interner), "map{str: int}");
    }

    #[test]
    fn formats_func_type() {
        let mut interner = StringInterner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let ty = TypeAst::Func(
            vec![(a, TypeAst::Str), (b, TypeAst::Int)],
            Box::new(TypeAst::Bool),
        );
        assert_eq!(format_type_ast(&ty, &interner), "func(a str, b int) bool");
    }
}
