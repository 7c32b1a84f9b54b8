#[cfg(test)]
mod tests {
    use super::super::*;
    use chrono::Utc;

    fn record(id: &str, name: &str, is_container: bool) -> Record {
        let now = Utc::now();
        Record {
            id: id.to_string(),
            org_id: "org1".to_string(),
            name: name.to_string(),
            is_container,
            origin: Origin::Upload,
            connector_id: None,
            record_type: Some(RecordType::File),
            indexing_status: Some(IndexingStatus::Completed),
            version: 1,
            external_revision_id: None,
            extension: Some("pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
            size_in_bytes: Some(1024),
            web_url: None,
            summary_doc_id: None,
            virtual_record_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_priorities_follow_the_table() {
        assert_eq!(Role::Owner.priority(), 6);
        assert_eq!(Role::Organizer.priority(), Role::Admin.priority());
        assert_eq!(Role::FileOrganizer.priority(), Role::Editor.priority());
        assert!(Role::Writer.priority() > Role::Commenter.priority());
        assert!(Role::Commenter.priority() > Role::Reader.priority());
    }

    #[test]
    fn role_parse_round_trips_and_rejects_garbage() {
        for role in [
            Role::Owner,
            Role::Organizer,
            Role::Admin,
            Role::FileOrganizer,
            Role::Editor,
            Role::Writer,
            Role::Commenter,
            Role::Reader,
        ] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert_eq!(Role::parse("editor").unwrap(), Role::Editor);
        assert!(matches!(
            Role::parse("SUPERUSER"),
            Err(crate::error::Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn max_role_is_commutative_and_keeps_the_winner() {
        assert_eq!(
            max_role(Some(Role::Reader), Some(Role::Owner)),
            Some(Role::Owner)
        );
        assert_eq!(
            max_role(Some(Role::Owner), Some(Role::Reader)),
            Some(Role::Owner)
        );
        assert_eq!(max_role(None, Some(Role::Writer)), Some(Role::Writer));
        assert_eq!(max_role(None, None), None);
        // ties keep the left operand; priority is what matters
        assert_eq!(
            max_role(Some(Role::Organizer), Some(Role::Admin))
                .unwrap()
                .priority(),
            5
        );
    }

    #[test]
    fn permission_edges_share_a_merge_key_across_roles() {
        let from = NodeKey::user("u1");
        let to = NodeKey::record("r1");
        let a = Edge::permission(from.clone(), to.clone(), Role::Reader, PrincipalType::User);
        let b = Edge::permission(from, to, Role::Owner, PrincipalType::User);
        assert_eq!(a.merge_key(), b.merge_key());
    }

    #[test]
    fn entity_relation_merge_keys_carry_the_relation_type() {
        let from = NodeKey::user("u1");
        let to = NodeKey::record("r1");
        let assigned = Edge::entity_relation(
            from.clone(),
            to.clone(),
            "ASSIGNED_TO",
            serde_json::json!({}),
        );
        let created = Edge::entity_relation(from, to, "CREATED_BY", serde_json::json!({}));
        assert_ne!(assigned.merge_key(), created.merge_key());
        assert_eq!(
            assigned.merge_key().discriminator.as_deref(),
            Some("ASSIGNED_TO")
        );
    }

    #[test]
    fn range_filter_handles_open_bounds_and_missing_values() {
        let open = RangeFilter::<i64>::default();
        assert!(open.contains(Some(5)));
        assert!(open.contains(None));

        let bounded = RangeFilter {
            gte: Some(10),
            lte: Some(20),
        };
        assert!(bounded.contains(Some(10)));
        assert!(bounded.contains(Some(20)));
        assert!(!bounded.contains(Some(9)));
        assert!(!bounded.contains(Some(21)));
        // a node without the attribute never matches a bounded range
        assert!(!bounded.contains(None));
    }

    #[test]
    fn classify_distinguishes_kbs_folders_and_records() {
        let folder = Node::Record(record("r1", "docs", true));
        let leaf = Node::Record(record("r2", "notes.pdf", false));
        assert_eq!(NodeSummary::classify(&folder), Some(NodeType::Folder));
        assert_eq!(NodeSummary::classify(&leaf), Some(NodeType::Record));

        let now = Utc::now();
        let kb = Node::RecordGroup(RecordGroup {
            id: "g1".to_string(),
            org_id: "org1".to_string(),
            name: "kb".to_string(),
            is_knowledge_base: true,
            connector_id: None,
            web_url: None,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(NodeSummary::classify(&kb), Some(NodeType::KnowledgeBase));

        let user = Node::User(User {
            id: "u1".to_string(),
            external_id: "x1".to_string(),
            org_id: "org1".to_string(),
            email: "u1@example.com".to_string(),
            full_name: None,
            is_admin: false,
        });
        assert_eq!(NodeSummary::classify(&user), None);
    }

    #[test]
    fn filters_match_on_name_type_and_size() {
        let node = NodeSummary::from_node(
            &Node::Record(record("r1", "Quarterly Report", false)),
            None,
            false,
            Some(Role::Reader),
        )
        .unwrap();

        let mut filters = SearchFilters {
            search: Some("quarterly".to_string()),
            ..SearchFilters::default()
        };
        assert!(filters.matches(&node));

        filters.search = Some("missing".to_string());
        assert!(!filters.matches(&node));

        filters.search = None;
        filters.record_types = Some(vec![RecordType::Mail]);
        assert!(!filters.matches(&node));

        filters.record_types = None;
        filters.size = Some(RangeFilter {
            gte: Some(2048),
            lte: None,
        });
        assert!(!filters.matches(&node));
    }
}
