//! Cataloguing: works and their physical copies

use crate::error::{AppError, AppResult};
use crate::models::{norm_author_key, BookCopy, CopyStatus, Work, WorkId, WorkSummary};

use super::LibraryService;

/// Outcome of [`LibraryService::add_work`]: either a freshly created work,
/// or copies merged into an existing one.
#[derive(Debug, Clone)]
pub struct AddWorkOutcome {
    pub work_id: WorkId,
    pub created: bool,
    pub copies_added: u32,
}

impl LibraryService {
    /// Catalogue a work with at least one copy. A non-deleted work with the
    /// same title and normalized author merely receives the new copies.
    pub fn add_work(
        &mut self,
        title: &str,
        author_display: &str,
        copies: u32,
    ) -> AppResult<AddWorkOutcome> {
        let title = title.trim();
        let author_display = author_display.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if author_display.is_empty() {
            return Err(AppError::Validation("author must not be empty".to_string()));
        }
        if copies < 1 {
            return Err(AppError::Validation(
                "copy count must be at least 1".to_string(),
            ));
        }

        let author_key = norm_author_key(author_display);
        let today = self.clock.today();

        let (work_id, created) = match self.catalog.find_active_work(title, &author_key) {
            Some(work) => (work.work_id, false),
            None => {
                let work_id = self.catalog.next_work_id();
                let work = Work {
                    work_id,
                    title: title.to_string(),
                    author_key,
                    author_display: author_display.to_string(),
                    registered_date: today,
                    deleted_date: None,
                };
                self.catalog.works.insert(work_id, work);
                (work_id, true)
            }
        };

        for _ in 0..copies {
            let copy_id = self.catalog.next_copy_id();
            self.catalog.copies.insert(
                copy_id,
                BookCopy {
                    copy_id,
                    work_id,
                    status: CopyStatus::Available,
                    registered_date: today,
                    deleted_date: None,
                },
            );
        }
        self.catalog.persist()?;

        if created {
            tracing::info!("catalogued work {} with {} copy(ies)", work_id, copies);
        } else {
            tracing::info!("added {} copy(ies) to existing work {}", copies, work_id);
        }
        Ok(AddWorkOutcome {
            work_id,
            created,
            copies_added: copies,
        })
    }

    /// Logically delete a work and cascade to its non-deleted copies.
    /// Refused while any open loan references the work. Returns the number
    /// of copies the deletion cascaded to.
    pub fn delete_work(&mut self, work_id: WorkId) -> AppResult<usize> {
        match self.catalog.work(work_id) {
            Some(work) if !work.is_deleted() => {}
            _ => {
                return Err(AppError::NotFound(format!(
                    "work {work_id} does not exist or is already deleted"
                )))
            }
        }
        let open = self.catalog.open_loans_for_work(work_id);
        if open > 0 {
            return Err(AppError::BusinessRule(format!(
                "work {work_id} still has {open} open loan(s)"
            )));
        }

        let today = self.clock.today();
        if let Some(work) = self.catalog.work_mut(work_id) {
            work.deleted_date = Some(today);
        }
        let mut cascaded = 0;
        for copy in self.catalog.copies.values_mut() {
            if copy.work_id == work_id && copy.deleted_date.is_none() {
                copy.deleted_date = Some(today);
                if copy.status == CopyStatus::Available {
                    copy.status = CopyStatus::Deleted;
                }
                cascaded += 1;
            }
        }
        self.catalog.persist()?;
        tracing::info!("deleted work {} and {} copy(ies)", work_id, cascaded);
        Ok(cascaded)
    }

    /// All non-deleted works with their copy counts.
    pub fn list_works(&self) -> Vec<WorkSummary> {
        self.catalog
            .works
            .values()
            .filter(|w| !w.is_deleted())
            .map(|w| self.work_summary(w))
            .collect()
    }

    /// Case-insensitive substring search over title and author display name.
    pub fn search_works(&self, keyword: &str) -> Vec<WorkSummary> {
        let needle = keyword.trim().to_lowercase();
        self.catalog
            .works
            .values()
            .filter(|w| !w.is_deleted())
            .filter(|w| {
                w.title.to_lowercase().contains(&needle)
                    || w.author_display.to_lowercase().contains(&needle)
            })
            .map(|w| self.work_summary(w))
            .collect()
    }

    fn work_summary(&self, work: &Work) -> WorkSummary {
        let (nb_copies, nb_available) = self.catalog.copy_counts(work.work_id);
        WorkSummary {
            work_id: work.work_id,
            title: work.title.clone(),
            author: work.author_display.clone(),
            nb_copies,
            nb_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::config::CirculationConfig;
    use crate::repository::Catalog;

    fn service() -> (LibraryService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();
        let clock = Clock::new("2025-03-01".parse().unwrap());
        let (service, _) =
            LibraryService::boot(catalog, clock, &CirculationConfig::default()).unwrap();
        (service, dir)
    }

    #[test]
    fn merges_copies_into_existing_work_by_author_key() {
        let (mut service, _dir) = service();
        let first = service.add_work("Clean Code", "Robert Martin", 2).unwrap();
        assert!(first.created);

        let second = service
            .add_work("Clean Code", "robert   martin", 1)
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.work_id, first.work_id);

        let works = service.list_works();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].nb_copies, 3);
        assert_eq!(works[0].nb_available, 3);
    }

    #[test]
    fn deleted_work_is_not_merge_target() {
        let (mut service, _dir) = service();
        let first = service.add_work("Clean Code", "Robert Martin", 1).unwrap();
        service.delete_work(first.work_id).unwrap();

        let second = service.add_work("Clean Code", "Robert Martin", 1).unwrap();
        assert!(second.created);
        assert_ne!(second.work_id, first.work_id);
    }

    #[test]
    fn rejects_empty_title_author_and_zero_copies() {
        let (mut service, _dir) = service();
        assert!(matches!(
            service.add_work("  ", "Robert Martin", 1),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.add_work("Clean Code", "", 1),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.add_work("Clean Code", "Robert Martin", 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn delete_cascades_to_copies() {
        let (mut service, _dir) = service();
        let outcome = service.add_work("Clean Code", "Robert Martin", 2).unwrap();
        let cascaded = service.delete_work(outcome.work_id).unwrap();
        assert_eq!(cascaded, 2);

        assert!(service.list_works().is_empty());
        let catalog = service.catalog();
        for copy in [1, 2] {
            let copy = catalog.copy(copy).unwrap();
            assert_eq!(copy.status, CopyStatus::Deleted);
            assert!(copy.deleted_date.is_some());
        }
    }

    #[test]
    fn delete_twice_is_not_found() {
        let (mut service, _dir) = service();
        let outcome = service.add_work("Clean Code", "Robert Martin", 1).unwrap();
        service.delete_work(outcome.work_id).unwrap();
        assert!(matches!(
            service.delete_work(outcome.work_id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_author() {
        let (mut service, _dir) = service();
        service.add_work("Clean Code", "Robert Martin", 1).unwrap();
        service
            .add_work("The Pragmatic Programmer", "Andrew Hunt", 1)
            .unwrap();

        assert_eq!(service.search_works("clean").len(), 1);
        assert_eq!(service.search_works("MARTIN").len(), 1);
        assert_eq!(service.search_works("programmer").len(), 1);
        assert_eq!(service.search_works("nothing").len(), 0);
    }
}
