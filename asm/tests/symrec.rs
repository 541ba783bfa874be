use rkasm::bytecode::{Bytecode, DataValue, DataValues};
use rkasm::expr::Expr;
use rkasm::print::Printer;
use rkasm::{
    BytecodeRef, DbgObjfmt, Diags, Error, Location, MsgKind, Sections, Status, SymKind, SymRef,
    SymbolTable, Visibility,
};
use std::ops::ControlFlow;
use std::rc::Rc;

fn loc(line: u64) -> Location {
    Location::new("main.rk", line)
}

fn table() -> (SymbolTable, Rc<DbgObjfmt>) {
    let objfmt = Rc::new(DbgObjfmt::new());
    (SymbolTable::with_objfmt(objfmt.clone()), objfmt)
}

fn names(symtab: &SymbolTable) -> Vec<String> {
    let mut names = vec![];
    symtab.traverse(|sym| {
        names.push(sym.name().to_string());
        ControlFlow::Continue(())
    });
    names
}

#[test]
fn use_creates_one_record() {
    let (mut symtab, _) = table();
    let a = symtab.use_symbol("foo", &loc(1));
    let b = symtab.use_symbol("foo", &loc(2));
    assert_eq!(a, b);
    assert_eq!(names(&symtab), vec!["foo"]);
    assert_eq!(symtab[a].status(), Status::USED);
    // first use wins the location
    assert_eq!(symtab[a].location().line, 1);
}

#[test]
fn forward_reference() {
    let (mut symtab, _) = table();
    let mut diags = Diags::new();
    let used = symtab.use_symbol("later", &loc(1));
    let defined = symtab.define_equ("later", Expr::int(3), &loc(5), &mut diags);
    assert_eq!(used, defined);
    let status = symtab[used].status();
    assert!(status.contains(Status::USED | Status::DEFINED | Status::VALUED));

    symtab.finalize(&mut diags);
    assert!(!diags.has_error());
    assert_eq!(diags.iter().count(), 0);
}

#[test]
fn duplicate_equ_keeps_first() {
    let (mut symtab, _) = table();
    let mut diags = Diags::new();
    let id = symtab.define_equ("x", Expr::int(1), &loc(1), &mut diags);
    symtab.define_equ("x", Expr::int(2), &loc(2), &mut diags);

    assert_eq!(diags.error_count(), 1);
    let msg = diags.iter().next().unwrap();
    assert_eq!(msg.msg, "duplicate definition of `x'; first defined on line 1");
    assert_eq!(msg.loc.line, 2);
    assert_eq!(symtab[id].equ(), Some(&Expr::int(1)));
    assert_eq!(symtab[id].location().line, 1);
}

#[test]
fn duplicate_label_after_equ() {
    let (mut symtab, _) = table();
    let mut sections = Sections::new();
    let mut diags = Diags::new();
    let text = sections.get_or_insert(".text");
    let at = BytecodeRef {
        section: text,
        index: None,
    };
    symtab.define_equ("x", Expr::int(1), &loc(1), &mut diags);
    let r = symtab.define_label("x", at, true, &loc(2), &mut diags);
    assert_eq!(diags.error_count(), 1);
    assert!(matches!(r.symbol(&symtab).kind(), SymKind::Equ(_)));
}

#[test]
fn get_equ_only_for_constants() {
    let (mut symtab, _) = table();
    let mut sections = Sections::new();
    let mut diags = Diags::new();
    let text = sections.get_or_insert(".text");
    let at = BytecodeRef {
        section: text,
        index: None,
    };
    let r = symtab.define_label("start", at, true, &loc(1), &mut diags);
    let id = r.id().unwrap();
    assert_eq!(symtab[id].equ(), None);
    assert_eq!(symtab[id].label(), Some(&at));
    let used = symtab.use_symbol("ext", &loc(2));
    assert_eq!(symtab[used].equ(), None);
}

#[test]
fn common_then_extern_conflicts() {
    let (mut symtab, objfmt) = table();
    let mut diags = Diags::new();
    let id = symtab
        .declare("y", Visibility::COMMON, Some(DbgObjfmt::data("d1")), &loc(1), &mut diags)
        .unwrap();
    symtab
        .declare("y", Visibility::EXTERN, Some(DbgObjfmt::data("d2")), &loc(2), &mut diags)
        .unwrap();

    assert_eq!(diags.error_count(), 1);
    assert_eq!(objfmt.released(), vec![(Visibility::EXTERN, "d2".to_string())]);
    assert_eq!(symtab[id].visibility(), Visibility::COMMON);
    assert!(symtab[id].status().contains(Status::DEFINED));

    symtab.delete_all().unwrap();
    assert_eq!(
        objfmt.released(),
        vec![
            (Visibility::EXTERN, "d2".to_string()),
            (Visibility::COMMON, "d1".to_string()),
        ]
    );
    assert!(symtab.is_empty());
}

#[test]
fn extern_then_common_conflicts() {
    let (mut symtab, objfmt) = table();
    let mut diags = Diags::new();
    symtab.declare("z", Visibility::EXTERN, None, &loc(1), &mut diags).unwrap();
    symtab
        .declare("z", Visibility::COMMON, Some(DbgObjfmt::data("c")), &loc(2), &mut diags)
        .unwrap();
    assert_eq!(diags.error_count(), 1);
    assert_eq!(objfmt.released(), vec![(Visibility::COMMON, "c".to_string())]);
}

#[test]
fn common_and_extern_at_once_conflicts() {
    let (mut symtab, objfmt) = table();
    let mut diags = Diags::new();
    let both = Visibility::COMMON | Visibility::EXTERN;
    let id = symtab
        .declare("q", both, Some(DbgObjfmt::data("q")), &loc(1), &mut diags)
        .unwrap();
    assert_eq!(diags.error_count(), 1);
    assert_eq!(symtab[id].visibility(), Visibility::LOCAL);
    assert!(!symtab[id].status().contains(Status::DEFINED));
    assert_eq!(objfmt.released(), vec![(both, "q".to_string())]);
}

#[test]
fn visibility_accumulates() {
    let (mut symtab, objfmt) = table();
    let mut diags = Diags::new();
    let id = symtab
        .declare("f", Visibility::EXTERN, Some(DbgObjfmt::data("e")), &loc(1), &mut diags)
        .unwrap();
    symtab
        .declare("f", Visibility::GLOBAL, Some(DbgObjfmt::data("g")), &loc(2), &mut diags)
        .unwrap();
    assert!(!diags.has_error());
    assert_eq!(symtab[id].visibility(), Visibility::EXTERN | Visibility::GLOBAL);

    symtab.delete_all().unwrap();
    assert_eq!(
        objfmt.released(),
        vec![
            (Visibility::GLOBAL, "g".to_string()),
            (Visibility::EXTERN, "e".to_string()),
        ]
    );
}

#[test]
fn declare_after_define_is_rejected() {
    let (mut symtab, objfmt) = table();
    let mut diags = Diags::new();
    symtab.define_equ("k", Expr::int(1), &loc(1), &mut diags);
    let id = symtab
        .declare("k", Visibility::GLOBAL, Some(DbgObjfmt::data("g")), &loc(2), &mut diags)
        .unwrap();
    assert_eq!(diags.error_count(), 1);
    assert_eq!(symtab[id].visibility(), Visibility::LOCAL);
    assert_eq!(objfmt.released().len(), 1);
}

#[test]
fn declare_local_payload_is_fatal() {
    let (mut symtab, objfmt) = table();
    let mut diags = Diags::new();
    let res = symtab.declare("l", Visibility::LOCAL, Some(DbgObjfmt::data("?")), &loc(1), &mut diags);
    assert!(matches!(res, Err(Error::UnexpectedVisibility(_))));
    assert_eq!(objfmt.released().len(), 1);
}

#[test]
fn declare_without_objfmt_is_fatal() {
    let mut symtab = SymbolTable::new();
    let mut diags = Diags::new();
    let res = symtab.declare("g", Visibility::GLOBAL, None, &loc(1), &mut diags);
    assert!(matches!(res, Err(Error::NoObjectFormat)));
    assert!(matches!(symtab.delete_all(), Err(Error::NoObjectFormat)));
}

#[test]
fn finalize_reports_undefined_once() {
    let (mut symtab, _) = table();
    let mut diags = Diags::new();
    symtab.use_symbol("missing", &loc(4));
    symtab.finalize(&mut diags);

    assert_eq!(diags.count(MsgKind::Error), 1);
    assert_eq!(diags.count(MsgKind::Note), 1);
    let msgs: Vec<_> = diags.iter().collect();
    assert_eq!(msgs[0].msg, "undefined symbol `missing' (first use)");
    assert_eq!(msgs[0].loc.line, 4);
    assert_eq!(msgs[1].kind, MsgKind::Note);
}

#[test]
fn finalize_single_note_at_earliest() {
    let (mut symtab, _) = table();
    let mut diags = Diags::new();
    symtab.use_symbol("c", &loc(30));
    symtab.use_symbol("a", &loc(10));
    symtab.use_symbol("b", &loc(20));
    symtab.declare("e", Visibility::EXTERN, None, &loc(1), &mut diags).unwrap();
    symtab.use_symbol("e", &loc(2));
    symtab.finalize(&mut diags);

    assert_eq!(diags.count(MsgKind::Error), 3);
    assert_eq!(diags.count(MsgKind::Note), 1);
    let note = diags.iter().find(|m| m.kind == MsgKind::Note).unwrap();
    assert_eq!(note.loc.line, 10);
}

#[test]
fn summary_note_ignores_error_limit() {
    let (mut symtab, _) = table();
    let mut diags = Diags::with_limit(Some(1), false);
    symtab.use_symbol("a", &loc(10));
    symtab.use_symbol("b", &loc(20));
    symtab.use_symbol("c", &loc(30));
    symtab.finalize(&mut diags);

    assert_eq!(diags.error_count(), 3);
    assert_eq!(diags.count(MsgKind::Error), 1);
    let notes: Vec<_> = diags.iter().filter(|m| m.kind == MsgKind::Note).collect();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].msg, "too many errors; further errors are not shown");
    assert_eq!(notes[1].msg, " (Each undefined symbol is reported only once.)");
    assert_eq!(notes[1].loc.line, 10);
}

#[test]
fn traverse_stops_early() {
    let (mut symtab, _) = table();
    for name in ["a", "b", "c"] {
        symtab.use_symbol(name, &loc(1));
    }
    let mut seen = 0;
    let completed = symtab.traverse(|sym| {
        seen += 1;
        if sym.name() == "b" {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert!(!completed);
    assert_eq!(seen, 2);
    assert!(symtab.traverse(|_| ControlFlow::Continue(())));
}

#[test]
fn standalone_label_stays_out_of_table() {
    let (mut symtab, _) = table();
    let mut sections = Sections::new();
    let mut diags = Diags::new();
    let text = sections.get_or_insert(".text");
    let at = BytecodeRef {
        section: text,
        index: None,
    };
    symtab.define_label("main", at, true, &loc(1), &mut diags);
    let local = symtab.define_label("main", at, false, &loc(2), &mut diags);
    assert!(!diags.has_error());
    assert!(matches!(local, SymRef::Standalone(_)));
    let status = local.symbol(&symtab).status();
    assert!(status.contains(Status::NOT_IN_TABLE | Status::DEFINED));

    let before = names(&symtab);
    symtab.delete(local).unwrap();
    assert_eq!(names(&symtab), before);

    // deleting a table entry through the single path does nothing
    let id = symtab.lookup("main").unwrap();
    symtab.delete(SymRef::InTable(id)).unwrap();
    assert_eq!(names(&symtab), vec!["main"]);
}

#[test]
fn label_follows_bytecode() {
    let (mut symtab, _) = table();
    let mut sections = Sections::new();
    let mut diags = Diags::new();
    let text = sections.get_or_insert(".text");
    let values: DataValues = vec![DataValue::from_string("hi")].into_iter().collect();
    let index = sections
        .get_mut(text)
        .unwrap()
        .bcs
        .append(Bytecode::data(values, 1, loc(1)));
    let at = BytecodeRef {
        section: text,
        index,
    };
    let id = symtab
        .define_label("after", at, true, &loc(2), &mut diags)
        .id()
        .unwrap();

    let label = symtab[id].label().unwrap();
    assert!(sections.resolve(label).is_some());
    assert_eq!(symtab.get_int_value(id, true, &sections), None);

    sections.remove(text);
    assert!(sections.resolve(symtab[id].label().unwrap()).is_none());
}

#[test]
fn int_value_of_constants() {
    let (mut symtab, _) = table();
    let sections = Sections::new();
    let mut diags = Diags::new();
    let k = symtab.define_equ("k", Expr::int(6).mul(Expr::int(7)), &loc(1), &mut diags);
    let s = symtab.define_equ("s", Expr::sym("k"), &loc(2), &mut diags);
    let u = symtab.use_symbol("u", &loc(3));
    assert_eq!(symtab.get_int_value(k, false, &sections), Some(42));
    assert_eq!(symtab.get_int_value(s, false, &sections), None);
    assert_eq!(symtab.get_int_value(u, true, &sections), None);
    assert_eq!(symtab.equ_value("k"), Some(42));
    assert_eq!(symtab.equ_value("nope"), None);
}

#[test]
fn symbol_dump() {
    let (mut symtab, _) = table();
    let sections = Sections::new();
    let mut diags = Diags::new();
    symtab.define_equ("k", Expr::int(4), &loc(1), &mut diags);
    symtab
        .declare("k2", Visibility::GLOBAL, Some(DbgObjfmt::data("g")), &loc(2), &mut diags)
        .unwrap();

    let mut out = String::new();
    symtab.print_all(&mut Printer::new(&mut out), &sections).unwrap();
    assert_eq!(
        out,
        "Symbol `k'\n \
         _EQU_\n \
         Expn=4\n \
         Status=Defined,Valued\n \
         Visibility=Local\n \
         Filename=\"main.rk\" Line Number=1\n\
         Symbol `k2'\n \
         -Unknown (Common/Extern)-\n \
         Status=None\n \
         Visibility=Global\n \
         Global object format-specific data:\n  \
         Global data=\"g\"\n \
         Filename=\"main.rk\" Line Number=2\n"
    );
}
