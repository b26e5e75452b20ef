use formwork::{Catalog, FormError, Formable, TypeError, from_str, unmarshal};
use formwork_testhelpers::test;

#[derive(Debug, Default, Clone, PartialEq, Formable)]
struct Paging {
    #[form(rename = "page")]
    page: i64,
    #[form(rename = "per_page")]
    per_page: Option<i64>,
}

#[test]
fn direct_embedding() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(rename = "q")]
        q: String,
        #[form(flatten)]
        paging: Paging,
    }

    let search: Search = from_str("q=rust&page=3&per_page=20").unwrap();
    assert_eq!(search.q, "rust");
    assert_eq!(
        search.paging,
        Paging {
            page: 3,
            per_page: Some(20),
        }
    );
}

#[test]
fn embedding_behind_an_option_allocates_on_demand() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(rename = "q")]
        q: String,
        #[form(flatten)]
        paging: Option<Paging>,
    }

    let search: Search = from_str("q=rust").unwrap();
    assert_eq!(search.paging, None);

    let search: Search = from_str("page=2").unwrap();
    assert_eq!(
        search.paging,
        Some(Paging {
            page: 2,
            per_page: None,
        })
    );
}

#[test]
fn embedding_behind_a_box() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(flatten)]
        paging: Box<Paging>,
    }

    let search: Search = from_str("per_page=50").unwrap();
    assert_eq!(search.paging.per_page, Some(50));
}

#[test]
fn nested_embedding() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Middle {
        #[form(rename = "m")]
        m: bool,
        #[form(flatten)]
        paging: Option<Paging>,
    }

    #[derive(Debug, Default, PartialEq, Formable)]
    struct Outer {
        #[form(flatten)]
        middle: Middle,
    }

    let outer: Outer = from_str("m=1&page=9").unwrap();
    assert!(outer.middle.m);
    assert_eq!(outer.middle.paging.map(|p| p.page), Some(9));

    let catalog = Catalog::build(Outer::SHAPE).unwrap();
    let paths: Vec<Vec<&str>> = catalog
        .iter()
        .map(|d| d.path().map(|f| f.name).collect())
        .collect();
    assert_eq!(
        paths,
        [
            vec!["middle", "m"],
            vec!["middle", "paging", "page"],
            vec!["middle", "paging", "per_page"],
        ]
    );
}

#[test]
fn outer_names_shadow_embedded_ones() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(rename = "page")]
        page: i64,
        #[form(flatten)]
        paging: Paging,
    }

    let search: Search = from_str("page=4").unwrap();
    assert_eq!(search.page, 4);
    assert_eq!(search.paging.page, 0);
}

#[test]
fn embedded_names_shadow_later_ones() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(flatten)]
        paging: Paging,
        #[form(rename = "page")]
        page: i64,
    }

    let search: Search = from_str("page=4").unwrap();
    assert_eq!(search.paging.page, 4);
    assert_eq!(search.page, 0);
}

#[test]
fn tagged_embeddings_are_not_expanded() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(flatten, rename = "paging")]
        paging: Paging,
    }

    let search: Search = from_str("page=4").unwrap();
    assert_eq!(search.paging.page, 0);

    let mut search = Search::default();
    let err = unmarshal("paging=1", &mut search).unwrap_err();
    assert!(matches!(
        err,
        FormError::Type(TypeError::UnsupportedField { field: "paging", .. })
    ));
}

#[test]
fn doubly_indirect_embeddings_are_not_expanded() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(flatten)]
        paging: Option<Box<Paging>>,
    }

    let catalog = Catalog::build(Search::SHAPE).unwrap();
    assert!(catalog.is_empty());

    let search: Search = from_str("page=4").unwrap();
    assert_eq!(search.paging, None);
}

#[test]
fn empty_rename_counts_as_untagged() {
    #[derive(Debug, Default, PartialEq, Formable)]
    struct Search {
        #[form(flatten, rename = "")]
        paging: Paging,
    }

    let search: Search = from_str("page=5").unwrap();
    assert_eq!(search.paging.page, 5);
}
