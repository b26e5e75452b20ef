use core::convert::Infallible;

use formwork::{FieldDecoder, Formable, unmarshal};
use formwork_testhelpers::test;

/// A record that decodes itself: it stores the raw value reversed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Formable)]
struct Reversed {
    text: String,
}

impl FieldDecoder for Reversed {
    type Error = Infallible;

    fn decode_field(&mut self, raw: &str) -> Result<(), Self::Error> {
        self.text = raw.chars().rev().collect();
        Ok(())
    }
}

/// A named string with its own decoder, which wins over the `String` rule.
#[derive(Debug, Default, Clone, PartialEq, Eq, Formable)]
#[form(transparent)]
struct ReversedString(String);

impl FieldDecoder for ReversedString {
    type Error = Infallible;

    fn decode_field(&mut self, raw: &str) -> Result<(), Self::Error> {
        self.0 = raw.chars().rev().collect();
        Ok(())
    }
}

#[test]
fn int_direct() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "a")]
        a: i64,
    }

    let mut actual = Form::default();
    unmarshal("a=4", &mut actual).unwrap();
    assert_eq!(actual, Form { a: 4 });
}

#[test]
fn int_behind_one_indirection() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "a")]
        a: Option<i64>,
    }

    let mut actual = Form::default();
    unmarshal("a=4", &mut actual).unwrap();
    assert_eq!(actual.a, Some(4));
}

#[test]
fn int_behind_two_indirections() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "a")]
        a: Option<Option<i64>>,
    }

    let mut actual = Form::default();
    unmarshal("a=-4", &mut actual).unwrap();
    assert_eq!(actual.a, Some(Some(-4)));
}

#[test]
fn int_behind_boxes() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "a")]
        a: Box<i32>,
        #[form(rename = "b")]
        b: Option<Box<i32>>,
        #[form(rename = "c")]
        c: Box<Option<Box<i16>>>,
    }

    let mut actual = Form::default();
    unmarshal("a=1&b=-2&c=3", &mut actual).unwrap();
    assert_eq!(*actual.a, 1);
    assert_eq!(actual.b, Some(Box::new(-2)));
    assert_eq!(*actual.c, Some(Box::new(3)));
}

#[test]
fn string_at_every_depth() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "sometext")]
        s: String,
        #[form(rename = "sometext")]
        unreached: String,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct Pointer {
        #[form(rename = "sometext")]
        s: Option<String>,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct PointerToPointer {
        #[form(rename = "sometext")]
        s: Option<Box<String>>,
    }

    let mut direct = Form::default();
    unmarshal("sometext=text", &mut direct).unwrap();
    assert_eq!(direct.s, "text");
    assert_eq!(direct.unreached, "");

    let mut pointer = Pointer::default();
    unmarshal("sometext=text", &mut pointer).unwrap();
    assert_eq!(pointer.s.as_deref(), Some("text"));

    let mut double = PointerToPointer::default();
    unmarshal("sometext=text", &mut double).unwrap();
    assert_eq!(double.s, Some(Box::new("text".to_string())));
}

#[test]
fn bool_at_every_depth() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "b")]
        b: bool,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct Pointer {
        #[form(rename = "b")]
        b: Option<bool>,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct PointerToPointer {
        #[form(rename = "b")]
        b: Option<Option<bool>>,
    }

    let mut direct = Form::default();
    unmarshal("b=true", &mut direct).unwrap();
    assert!(direct.b);

    let mut pointer = Pointer::default();
    unmarshal("b=true", &mut pointer).unwrap();
    assert_eq!(pointer.b, Some(true));

    let mut double = PointerToPointer::default();
    unmarshal("b=true", &mut double).unwrap();
    assert_eq!(double.b, Some(Some(true)));
}

#[test]
fn bool_false_literals() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "b")]
        b: bool,
        #[form(rename = "pb")]
        pb: Option<bool>,
        #[form(rename = "ppb")]
        ppb: Option<Box<bool>>,
    }

    let mut actual = Form {
        b: true,
        ..Form::default()
    };
    unmarshal("b=false&pb=0&ppb=True", &mut actual).unwrap();
    assert_eq!(
        actual,
        Form {
            b: false,
            pb: Some(false),
            ppb: Some(Box::new(true)),
        }
    );
}

#[test]
fn custom_record_at_every_depth() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "sometext")]
        s: Reversed,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct Pointer {
        #[form(rename = "sometext")]
        s: Option<Reversed>,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct PointerToPointer {
        #[form(rename = "sometext")]
        s: Option<Box<Reversed>>,
    }

    let expected = Reversed {
        text: "txet".to_string(),
    };

    let mut direct = Form::default();
    unmarshal("sometext=text", &mut direct).unwrap();
    assert_eq!(direct.s, expected);

    let mut pointer = Pointer::default();
    unmarshal("sometext=text", &mut pointer).unwrap();
    assert_eq!(pointer.s.as_ref(), Some(&expected));

    let mut double = PointerToPointer::default();
    unmarshal("sometext=text", &mut double).unwrap();
    assert_eq!(double.s, Some(Box::new(expected)));
}

#[test]
fn named_string_with_decoder_at_every_depth() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "sometext")]
        s: ReversedString,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct Pointer {
        #[form(rename = "sometext")]
        s: Option<ReversedString>,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct PointerToPointer {
        #[form(rename = "sometext")]
        s: Option<Option<ReversedString>>,
    }

    let expected = ReversedString("txet".to_string());

    let mut direct = Form::default();
    unmarshal("sometext=text", &mut direct).unwrap();
    assert_eq!(direct.s, expected);

    let mut pointer = Pointer::default();
    unmarshal("sometext=text", &mut pointer).unwrap();
    assert_eq!(pointer.s, Some(expected.clone()));

    let mut double = PointerToPointer::default();
    unmarshal("sometext=text", &mut double).unwrap();
    assert_eq!(double.s, Some(Some(expected)));
}

#[test]
fn tuple_struct_destination() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Pair(
        #[form(rename = "left")] i32,
        #[form(rename = "right")] Option<ReversedString>,
    );

    let mut actual = Pair::default();
    unmarshal("right=ab&left=7", &mut actual).unwrap();
    assert_eq!(actual, Pair(7, Some(ReversedString("ba".into()))));
}

#[test]
fn set_indirections_are_reused() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Form {
        #[form(rename = "a")]
        a: Option<Box<i64>>,
    }

    let mut actual = Form {
        a: Some(Box::new(1)),
    };
    let before: *const i64 = actual.a.as_deref().unwrap();
    unmarshal("a=9", &mut actual).unwrap();
    let after: *const i64 = actual.a.as_deref().unwrap();
    assert!(core::ptr::eq(before, after));
    assert_eq!(actual.a, Some(Box::new(9)));
}
