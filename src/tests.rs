#[cfg(test)]
mod tests {
    use crate::builders::memory::MemoryProvider;
    use crate::core::config::InputSettings;
    use crate::core::error::ScmError;
    use crate::core::repository::ScmRepository;
    use crate::core::service::ScmService;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn provider(id: &str) -> Rc<MemoryProvider> {
        Rc::new(MemoryProvider::new(id, format!("Repo {id}")))
    }

    fn ids(repositories: &[Rc<ScmRepository>]) -> Vec<String> {
        repositories.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_duplicate_registration_leaves_registry_unchanged() {
        let service = ScmService::new();
        let added = Rc::new(Cell::new(0));
        let counter = Rc::clone(&added);
        let _sub = service.on_did_add_repository(move |_| counter.set(counter.get() + 1));

        let first = service.register(provider("a")).unwrap();
        let before = service.repositories();

        let err = service.register(provider("a")).unwrap_err();
        assert_eq!(err, ScmError::DuplicateProvider { id: "a".to_string() });
        assert!(err.to_string().contains("'a'"));

        let after = service.repositories();
        assert_eq!(after.len(), before.len());
        assert!(Rc::ptr_eq(&after[0], &first));
        assert_eq!(added.get(), 1);
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let service = ScmService::new();
        let err = service.register(provider("")).unwrap_err();
        assert!(matches!(err, ScmError::InvalidProviderId { .. }));
        assert!(service.is_empty());
        assert!(service.selected_repository().is_none());
    }

    #[test]
    fn test_first_registration_stays_selected() {
        let service = ScmService::new();
        let first = service.register(provider("a")).unwrap();
        for id in ["b", "c", "d"] {
            service.register(provider(id)).unwrap();
            assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &first));
        }
        assert_eq!(ids(&service.repositories()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_first_registration_fires_add_then_selection() {
        let service = ScmService::new();
        let events = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&events);
        let _a = service.on_did_add_repository(move |r| log.borrow_mut().push(format!("add:{}", r.id())));
        let log = Rc::clone(&events);
        let _b = service.on_did_change_selected_repository(move |r| {
            let id = r.as_ref().map(|r| r.id().to_string()).unwrap_or_default();
            log.borrow_mut().push(format!("select:{id}"));
        });

        service.register(provider("a")).unwrap();
        service.register(provider("b")).unwrap();

        assert_eq!(*events.borrow(), vec!["add:a", "select:a", "add:b"]);
    }

    #[test]
    fn test_selection_setter_always_notifies() {
        let service = ScmService::new();
        let a = service.register(provider("a")).unwrap();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let _sub = service.on_did_change_selected_repository(move |_| counter.set(counter.get() + 1));

        service.set_selected_repository(Some(Rc::clone(&a)));
        service.set_selected_repository(Some(Rc::clone(&a)));
        service.set_selected_repository(None);
        service.set_selected_repository(None);

        assert_eq!(fired.get(), 4);
        assert!(service.selected_repository().is_none());
    }

    #[test]
    fn test_selection_is_not_checked_for_membership() {
        let service = ScmService::new();
        let other = ScmService::new();
        let foreign = other.register(provider("x")).unwrap();

        service.set_selected_repository(Some(Rc::clone(&foreign)));
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &foreign));
        assert!(service.is_empty());
    }

    #[test]
    fn test_repository_selected_flag_always_notifies() {
        let service = ScmService::new();
        let repository = service.register(provider("a")).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = repository.on_did_change_selection(move |b| sink.borrow_mut().push(*b));

        assert!(!repository.selected());
        repository.set_selected(true);
        repository.set_selected(true);
        repository.set_selected(false);

        assert_eq!(*seen.borrow(), vec![true, true, false]);
        assert!(!repository.selected());
    }

    #[test]
    fn test_focus_notifies_without_state_change() {
        let service = ScmService::new();
        let repository = service.register(provider("a")).unwrap();
        let focused = Rc::new(Cell::new(0));
        let counter = Rc::clone(&focused);
        let _sub = repository.on_did_focus(move |_| counter.set(counter.get() + 1));

        repository.focus();
        repository.focus();
        assert_eq!(focused.get(), 2);
        assert!(!repository.selected());
    }

    #[test]
    fn test_dispose_twice_removes_once() {
        let service = ScmService::new();
        let memory = provider("a");
        let repository = service.register(memory.clone()).unwrap();
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let _sub = service.on_did_remove_repository(move |r| sink.borrow_mut().push(Rc::clone(r)));

        repository.dispose();
        assert!(service.repositories().is_empty());
        assert_eq!(removed.borrow().len(), 1);
        assert!(Rc::ptr_eq(&removed.borrow()[0], &repository));

        repository.dispose();
        assert_eq!(removed.borrow().len(), 1);
        // The provider sees every dispose call.
        assert_eq!(memory.dispose_count(), 2);
    }

    #[test]
    fn test_disposed_id_can_be_registered_again() {
        let service = ScmService::new();
        let first = service.register(provider("a")).unwrap();
        first.dispose();

        let second = service.register(provider("a")).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(service.len(), 1);
        // The service was empty again, so the new repository is selected.
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &second));
    }

    #[test]
    fn test_end_to_end_stale_selection() {
        let service = ScmService::new();
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let _sub = service.on_did_remove_repository(move |r| sink.borrow_mut().push(r.id().to_string()));

        let a = service.register(provider("a")).unwrap();
        assert_eq!(service.repositories().len(), 1);
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &a));

        service.register(provider("b")).unwrap();
        assert_eq!(service.repositories().len(), 2);
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &a));

        a.dispose();
        assert_eq!(ids(&service.repositories()), vec!["b"]);
        assert_eq!(*removed.borrow(), vec!["a"]);
        // Selection is deliberately left pointing at the removed repository.
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &a));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let service = ScmService::new();
        let a = service.register(provider("a")).unwrap();
        let snapshot = service.repositories();

        service.register(provider("b")).unwrap();
        a.dispose();

        assert_eq!(ids(&snapshot), vec!["a"]);
        assert_eq!(ids(&service.repositories()), vec!["b"]);
    }

    #[test]
    fn test_dispose_from_remove_handler() {
        let service = ScmService::new();
        let a = service.register(provider("a")).unwrap();
        let b = service.register(provider("b")).unwrap();

        // Removing "a" also disposes "b", and disposes "a" again from its own notification.
        let b_weak = Rc::downgrade(&b);
        let _sub = service.on_did_remove_repository(move |r| {
            r.dispose();
            if let Some(b) = b_weak.upgrade() {
                b.dispose();
            }
        });

        a.dispose();
        assert!(service.is_empty());
    }

    #[test]
    fn test_register_from_add_handler() {
        let service = Rc::new(ScmService::new());
        let weak = Rc::downgrade(&service);
        let _sub = service.on_did_add_repository(move |r| {
            if r.id() == "a"
                && let Some(service) = weak.upgrade()
            {
                service.register(provider("a-child")).unwrap();
            }
        });

        let a = service.register(provider("a")).unwrap();
        assert_eq!(ids(&service.repositories()), vec!["a", "a-child"]);
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &a));
    }

    #[test]
    fn test_dispose_from_add_handler_skips_selection() {
        let service = ScmService::new();
        let selections = Rc::new(Cell::new(0));
        let counter = Rc::clone(&selections);
        let _a = service.on_did_change_selected_repository(move |_| counter.set(counter.get() + 1));
        let _b = service.on_did_add_repository(|r| r.dispose());

        let memory = provider("a");
        let a = service.register(memory.clone()).unwrap();

        assert!(service.is_empty());
        assert!(!service.contains(&a));
        assert!(service.selected_repository().is_none());
        assert_eq!(selections.get(), 0);
        assert_eq!(memory.dispose_count(), 1);
    }

    #[test]
    fn test_service_dispose_closes_channels_but_keeps_repositories() {
        let service = ScmService::new();
        let a = service.register(provider("a")).unwrap();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let _sub = service.on_did_remove_repository(move |_| counter.set(counter.get() + 1));

        service.dispose();
        assert_eq!(service.len(), 1);

        let b = service.register(provider("b")).unwrap();
        a.dispose();
        b.dispose();
        assert_eq!(fired.get(), 0);
        assert!(service.is_empty());
    }

    #[test]
    fn test_dispose_after_service_dropped() {
        let memory = provider("a");
        let repository = {
            let service = ScmService::new();
            service.register(memory.clone()).unwrap()
        };
        repository.dispose();
        assert_eq!(memory.dispose_count(), 1);
    }

    #[test]
    fn test_input_settings_seed_new_inputs() {
        let service = ScmService::with_settings(InputSettings {
            default_placeholder: "Message".to_string(),
            visible: false,
        });
        let repository = service.register(provider("a")).unwrap();
        assert_eq!(repository.input().placeholder(), "Message");
        assert!(!repository.input().visible());
        assert_eq!(repository.input().value(), "");
    }

    #[test]
    fn test_lookup_by_id() {
        let service = ScmService::new();
        service.register(provider("a")).unwrap();
        let b = service.register(provider("b")).unwrap();
        assert!(Rc::ptr_eq(&service.repository("b").unwrap(), &b));
        assert!(service.repository("c").is_none());
    }
}
