//! Task comments with `@user` mentions.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use taskdeck_core::{Comment, CommentId, NotificationKind, TaskId, UserId};
use taskdeck_storage::Storage;
use tracing::{debug, warn};

use crate::notifications::deliver;
use crate::teams::{access, require, Access};
use crate::{Result, SharedStorage, WorkflowError};

fn mention_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(r"(?:^|[^\w@])@(\w(?:[\w.-]*\w)?)") {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "mention pattern failed to compile; mentions disabled");
                None
            }
        })
        .as_ref()
}

/// User ids mentioned as `@name` in `body`. Email addresses are ignored.
pub fn parse_mentions(body: &str) -> BTreeSet<UserId> {
    let Some(re) = mention_pattern() else {
        return BTreeSet::new();
    };
    re.captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| UserId::new(m.as_str()))
        .collect()
}

/// Posts and manages comments.
pub struct CommentService<S: Storage> {
    storage: SharedStorage<S>,
}

impl<S: Storage> CommentService<S> {
    /// Create a service over shared storage.
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self { storage }
    }

    /// Post a comment. Stakeholders get `CommentAdded`, mentioned users get
    /// `Mention`; the author gets neither.
    pub async fn add(&self, author: &UserId, task_id: TaskId, body: impl Into<String>) -> Result<Comment> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(WorkflowError::Invalid("comment must not be empty".into()));
        }

        let mut storage = self.storage.lock().await;
        let task = storage
            .load_task(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))?;
        require(&*storage, &task, author, Access::View, "comment on").await?;

        let mut mentions = parse_mentions(&body);
        mentions.remove(author);
        let comment = Comment {
            id: CommentId::new(),
            task_id,
            author: author.clone(),
            body,
            mentions: mentions.clone(),
            created_at: chrono::Utc::now(),
            edited_at: None,
        };
        storage.save_comment(&comment).await?;

        let mut watchers = task.stakeholders();
        watchers.remove(author);
        let watchers: BTreeSet<UserId> = watchers.difference(&mentions).cloned().collect();
        deliver(
            &mut *storage,
            NotificationKind::CommentAdded,
            format!("{} commented on \"{}\"", author, task.title),
            watchers,
            Some(task_id),
        )
        .await?;
        deliver(
            &mut *storage,
            NotificationKind::Mention,
            format!("{} mentioned you on \"{}\"", author, task.title),
            mentions,
            Some(task_id),
        )
        .await?;

        storage.commit(&format!("Comment on task {}", task_id)).await?;
        debug!(comment = %comment.id, task = %task_id, "comment added");
        Ok(comment)
    }

    /// Comments on a task, oldest first.
    pub async fn list(&self, viewer: &UserId, task_id: TaskId) -> Result<Vec<Comment>> {
        let storage = self.storage.lock().await;
        let task = storage
            .load_task(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))?;
        require(&*storage, &task, viewer, Access::View, "read comments on").await?;
        Ok(storage.list_comments(task_id).await?)
    }

    /// Replace the body of a comment. Author only.
    ///
    /// Users mentioned for the first time by the new body get `Mention`;
    /// users already mentioned are not notified again.
    pub async fn edit(&self, author: &UserId, id: CommentId, body: impl Into<String>) -> Result<Comment> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(WorkflowError::Invalid("comment must not be empty".into()));
        }

        let mut storage = self.storage.lock().await;
        let mut comment = storage
            .load_comment(id)
            .await?
            .ok_or(WorkflowError::CommentNotFound(id))?;
        if &comment.author != author {
            return Err(WorkflowError::denied(author, format!("edit comment {}", id)));
        }
        let mut mentions = parse_mentions(&body);
        mentions.remove(author);
        let added: BTreeSet<UserId> = mentions.difference(&comment.mentions).cloned().collect();
        comment.body = body;
        comment.mentions = mentions;
        comment.edited_at = Some(chrono::Utc::now());
        storage.save_comment(&comment).await?;

        if !added.is_empty() {
            if let Some(task) = storage.load_task(comment.task_id).await? {
                deliver(
                    &mut *storage,
                    NotificationKind::Mention,
                    format!("{} mentioned you on \"{}\"", author, task.title),
                    added,
                    Some(task.id),
                )
                .await?;
            }
        }
        storage.commit(&format!("Edit comment {}", id)).await?;
        Ok(comment)
    }

    /// Delete a comment. Allowed for its author and whoever manages the task.
    pub async fn delete(&self, actor: &UserId, id: CommentId) -> Result<()> {
        let mut storage = self.storage.lock().await;
        let Some(comment) = storage.load_comment(id).await? else {
            return Ok(());
        };
        if &comment.author != actor {
            let allowed = match storage.load_task(comment.task_id).await? {
                Some(task) => access(&*storage, &task, actor).await? >= Access::Manage,
                None => false,
            };
            if !allowed {
                return Err(WorkflowError::denied(actor, format!("delete comment {}", id)));
            }
        }
        storage.delete_comment(id).await?;
        storage.commit(&format!("Delete comment {}", id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use taskdeck_core::Task;
    use taskdeck_storage::MemoryStorage;

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    #[test]
    fn test_parse_mentions() {
        let mentions = parse_mentions("@bob can you check with @carol.smith? cc alice@example.com, @bob.");
        let expected: BTreeSet<UserId> = [user("bob"), user("carol.smith")].into_iter().collect();
        assert_eq!(mentions, expected);
        assert!(parse_mentions("no mentions here").is_empty());
    }

    async fn setup() -> (CommentService<MemoryStorage>, SharedStorage<MemoryStorage>, Task) {
        let storage = shared(MemoryStorage::new());
        let mut task = Task::new("Review PR", user("alice")).unwrap();
        task.assigned_to.insert(user("bob"));
        storage.lock().await.save_task(&task).await.unwrap();
        (CommentService::new(storage.clone()), storage, task)
    }

    #[tokio::test]
    async fn test_comment_notifies_watchers_and_mentions() {
        let (service, storage, task) = setup().await;
        service.add(&user("bob"), task.id, "Looks good, @dave please merge").await.unwrap();

        let s = storage.lock().await;
        let alice = s.list_notifications(&user("alice")).await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].kind, NotificationKind::CommentAdded);

        let dave = s.list_notifications(&user("dave")).await.unwrap();
        assert_eq!(dave.len(), 1);
        assert_eq!(dave[0].kind, NotificationKind::Mention);

        assert!(s.list_notifications(&user("bob")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outsider_cannot_comment() {
        let (service, _, task) = setup().await;
        let err = service.add(&user("mallory"), task.id, "hi").await.unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_edit_is_author_only() {
        let (service, _, task) = setup().await;
        let comment = service.add(&user("bob"), task.id, "first").await.unwrap();
        assert!(service.edit(&user("alice"), comment.id, "hijack").await.is_err());

        let edited = service.edit(&user("bob"), comment.id, "second @alice").await.unwrap();
        assert_eq!(edited.body, "second @alice");
        assert!(edited.edited_at.is_some());
        assert!(edited.mentions.contains(&user("alice")));
    }

    #[tokio::test]
    async fn test_edit_rejects_blank_and_notifies_new_mentions() {
        let (service, storage, task) = setup().await;
        let comment = service.add(&user("bob"), task.id, "ping @dave").await.unwrap();

        let err = service.edit(&user("bob"), comment.id, "   ").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Invalid(_)));
        assert_eq!(service.list(&user("bob"), task.id).await.unwrap()[0].body, "ping @dave");

        service.edit(&user("bob"), comment.id, "ping @dave and @erin").await.unwrap();
        let s = storage.lock().await;
        assert_eq!(s.list_notifications(&user("dave")).await.unwrap().len(), 1);
        let erin = s.list_notifications(&user("erin")).await.unwrap();
        assert_eq!(erin.len(), 1);
        assert_eq!(erin[0].kind, NotificationKind::Mention);
        assert_eq!(erin[0].task_id, Some(task.id));
    }

    #[tokio::test]
    async fn test_owner_can_delete_any_comment() {
        let (service, _, task) = setup().await;
        let comment = service.add(&user("bob"), task.id, "spam").await.unwrap();
        service.delete(&user("alice"), comment.id).await.unwrap();
        assert!(service.list(&user("alice"), task.id).await.unwrap().is_empty());
    }
}
