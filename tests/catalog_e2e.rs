use std::sync::Arc;

use chrono::NaiveDate;
use gnosis::{
    split_author_list, BookmarkStore, Catalog, Comment, Dataset, EntityKind, ExecutionError,
    FlagReason, FlagReport, GnosisError, InMemoryBookmarkStore, InMemoryGraphStore, Paper,
    PaperCreation, Person, Relationship, ResolverConfig, UserId, ValidationError, Venue,
};

fn catalog_with_stores() -> (Catalog, Arc<InMemoryBookmarkStore>) {
    let graph = Arc::new(InMemoryGraphStore::new());
    let bookmarks = Arc::new(InMemoryBookmarkStore::new());
    let catalog = Catalog::new(graph, bookmarks.clone());
    (catalog, bookmarks)
}

fn create(catalog: &Catalog, title: &str, authors: &str) -> Paper {
    match catalog
        .create_paper(Paper::new(title), &split_author_list(authors))
        .unwrap()
    {
        PaperCreation::Created { paper, .. } => paper,
        PaperCreation::Duplicate(found) => panic!("unexpected duplicate: {found:?}"),
    }
}

#[test]
fn paper_lifecycle_with_citations_and_datasets() {
    let catalog = Catalog::in_memory();
    let resnet = create(
        &catalog,
        "Deep Residual Learning for Image Recognition",
        "Kaiming He, Xiangyu Zhang, Shaoqing Ren, Jian Sun",
    );
    let densenet = create(
        &catalog,
        "Densely Connected Convolutional Networks",
        "Gao Huang, Zhuang Liu, Kilian Q. Weinberger",
    );
    let imagenet = Dataset::new("ImageNet").with_keywords("images classification");
    catalog.save(&imagenet).unwrap();

    catalog.connect(densenet.id, Relationship::Cites, resnet.id).unwrap();
    catalog.connect(densenet.id, Relationship::EvaluatesOn, imagenet.id).unwrap();
    catalog.connect(densenet.id, Relationship::Cites, resnet.id).unwrap();

    let detail = catalog.paper_detail(densenet.id).unwrap();
    assert_eq!(detail.authors.len(), 3);
    assert_eq!(detail.authors[2].middle_name, vec!["Q.".to_string()]);
    assert_eq!(detail.cites.len(), 1);
    assert_eq!(detail.cites[0].id, resnet.id);
    assert_eq!(detail.datasets[0].name, "ImageNet");
    assert!(detail.venue.is_none());

    let cited = catalog.paper_detail(resnet.id).unwrap();
    assert_eq!(cited.cited_by[0].id, densenet.id);

    assert!(catalog
        .disconnect(densenet.id, Relationship::Cites, resnet.id)
        .unwrap());
    assert!(catalog.paper_detail(resnet.id).unwrap().cited_by.is_empty());
}

#[test]
fn invalid_edges_are_rejected() {
    let catalog = Catalog::in_memory();
    let paper = create(&catalog, "Notes", "");
    let person = Person::new("Ada", "Lovelace");
    catalog.save(&person).unwrap();

    let err = catalog
        .connect(paper.id, Relationship::Authors, person.id)
        .unwrap_err();
    assert!(matches!(
        err,
        GnosisError::Execution(ExecutionError::Storage { .. })
    ));
    catalog
        .connect(person.id, Relationship::Authors, paper.id)
        .unwrap();
}

#[test]
fn shared_authors_are_reused_across_papers() {
    let catalog = Catalog::in_memory();
    create(&catalog, "Computing Machinery and Intelligence", "Alan Turing");
    let second = catalog
        .create_paper(
            Paper::new("On Computable Numbers"),
            &split_author_list("alan turing, Alonzo Church"),
        )
        .unwrap();

    let PaperCreation::Created { authors, .. } = second else {
        panic!("expected the paper to be created");
    };
    assert_eq!(authors[0].0, "alan turing");
    assert!(!authors[0].1.is_created());
    assert!(authors[1].1.is_created());
    assert_eq!(catalog.count(EntityKind::Person).unwrap(), 2);
}

#[test]
fn duplicate_titles_are_returned_not_stored() {
    let catalog = Catalog::in_memory();
    let original = create(&catalog, "ImageNet Classification with Deep CNNs", "Alex Krizhevsky");

    let outcome = catalog
        .create_paper(
            Paper::new("imagenet classification deep cnns"),
            &split_author_list("Ilya Sutskever"),
        )
        .unwrap();
    match outcome {
        PaperCreation::Duplicate(found) => assert_eq!(found[0].id, original.id),
        other => panic!("expected duplicate, got {other:?}"),
    }
    assert_eq!(catalog.count(EntityKind::Paper).unwrap(), 1);
    assert_eq!(catalog.count(EntityKind::Person).unwrap(), 1);
}

#[test]
fn recent_papers_respect_configured_limit() {
    let config = ResolverConfig {
        recent_papers_limit: 2,
        ..ResolverConfig::default()
    };
    let catalog = Catalog::with_config(
        Arc::new(InMemoryGraphStore::new()),
        Arc::new(InMemoryBookmarkStore::new()),
        config,
    )
    .unwrap();
    for title in ["Alpha", "Bravo", "Charlie"] {
        create(&catalog, title, "Ada Lovelace");
    }

    let recent = catalog.recent_papers().unwrap();
    let titles: Vec<&str> = recent.iter().map(|s| s.paper.title.as_str()).collect();
    assert_eq!(titles, vec!["Charlie", "Bravo"]);
    assert_eq!(recent[0].authors, "A. Lovelace");
}

#[test]
fn invalid_config_is_rejected() {
    let err = ResolverConfig::from_json(r#"{ "text_search_limit": 0 }"#).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidLimit { .. }));

    let config = ResolverConfig {
        recent_papers_limit: 0,
        ..ResolverConfig::default()
    };
    let result = Catalog::with_config(
        Arc::new(InMemoryGraphStore::new()),
        Arc::new(InMemoryBookmarkStore::new()),
        config,
    );
    assert!(result.is_err_and(|e| e.is_validation()));
}

#[test]
fn search_entry_points() {
    let catalog = Catalog::in_memory();
    create(&catalog, "Attention Is All You Need", "Ashish Vaswani, Noam Shazeer");
    catalog
        .save(&Venue::new(
            "Neural Information Processing Systems",
            NaiveDate::from_ymd_opt(2017, 12, 4).unwrap(),
        ))
        .unwrap();
    catalog
        .save(&Dataset::new("WMT 2014").with_keywords("translation english german"))
        .unwrap();

    assert_eq!(catalog.search_papers("need attention").unwrap().len(), 1);
    assert_eq!(catalog.search_persons("noam").unwrap().len(), 1);
    assert_eq!(
        catalog.search_venues("information systems", Some(2017)).unwrap().len(),
        1
    );
    assert!(catalog.search_venues("information systems", Some(2018)).unwrap().is_empty());
    assert_eq!(
        catalog.search_datasets(Some("wmt"), Some("german")).unwrap().len(),
        1
    );
    assert!(catalog.search_datasets(Some("wmt"), Some("french")).unwrap().is_empty());
}

#[test]
fn moderation_hides_comments_from_detail() {
    let catalog = Catalog::in_memory();
    let paper = create(&catalog, "Notes", "");
    let kept = catalog
        .add_comment(paper.id, "reviewer", Some(UserId(1)), "Clear and correct.")
        .unwrap();
    let spam = catalog
        .add_comment(paper.id, "bot", None, "Buy now")
        .unwrap();

    let report = FlagReport::new(FlagReason::Spam, "advertising").reported_by(UserId(1));
    catalog.flag_comment(spam.id, report).unwrap();
    let flagged = catalog.flagged_comments().unwrap();
    assert_eq!(flagged.len(), 1);
    let moderation = flagged[0].moderation.as_ref().unwrap();
    assert_eq!(moderation.reason, FlagReason::Spam);
    assert_eq!(moderation.reporter, Some(UserId(1)));

    catalog.hide_comment(spam.id).unwrap();
    let visible: Vec<Comment> = catalog.paper_detail(paper.id).unwrap().comments;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, kept.id);

    let err = catalog.update_comment(kept.id, "   ").unwrap_err();
    assert!(err.is_validation());
    assert!(catalog
        .hide_comment(gnosis::NodeId::new())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn bookmarks_listing_and_removal() {
    let (catalog, store) = catalog_with_stores();
    let first = create(&catalog, "First Paper", "");
    let second = create(&catalog, "Second Paper", "");
    let reader = UserId(42);

    catalog.bookmark(reader, first.id).unwrap();
    let later = catalog.bookmark(reader, second.id).unwrap();
    catalog.bookmark(reader, first.id).unwrap();

    let papers = catalog.bookmarked_papers(reader).unwrap();
    let titles: Vec<&str> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["First Paper", "Second Paper"]);
    assert_eq!(store.find_by_paper(first.id).unwrap().len(), 1);

    assert!(catalog
        .remove_bookmark(UserId(7), later.id)
        .unwrap_err()
        .is_not_found());
    catalog.remove_bookmark(reader, later.id).unwrap();
    assert_eq!(catalog.bookmarks(reader).unwrap().len(), 1);
    assert!(catalog.remove_bookmark(reader, later.id).is_err());
}
