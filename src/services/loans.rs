//! Book instance lifecycle: copies, loans, returns and renewals

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{
        book_instance::{
            check_consistency, BookInstance, BookInstanceForm, CheckoutRequest, LoanStatus,
            RenewalForm,
        },
        permission::{Permission, Resource},
        user::UserClaims,
        PageQuery,
    },
    repository::BookInstanceStore,
    services::renewal::{default_renewal_date, validate_renewal},
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn BookInstanceStore>,
    clock: Arc<dyn Clock>,
    page_size: i64,
}

impl LoansService {
    pub fn new(store: Arc<dyn BookInstanceStore>, clock: Arc<dyn Clock>, page_size: i64) -> Self {
        Self {
            store,
            clock,
            page_size,
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    async fn load(&self, id: Uuid) -> AppResult<BookInstance> {
        self.store
            .get(id)
            .await?
            .map(|instance| instance.with_overdue(self.clock.today()))
            .ok_or_else(|| not_found(id))
    }

    fn flag_overdue(&self, instances: Vec<BookInstance>) -> Vec<BookInstance> {
        let today = self.clock.today();
        instances
            .into_iter()
            .map(|instance| instance.with_overdue(today))
            .collect()
    }

    /// List every copy in the catalog
    pub async fn list(&self, page: &PageQuery) -> AppResult<(Vec<BookInstance>, i64)> {
        let (instances, total) = self
            .store
            .list(page.offset(self.page_size), self.page_size)
            .await?;
        Ok((self.flag_overdue(instances), total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BookInstance> {
        self.load(id).await
    }

    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = self.store.list_for_book(book_id).await?;
        Ok(self.flag_overdue(instances))
    }

    pub async fn create(&self, claims: &UserClaims, form: BookInstanceForm) -> AppResult<BookInstance> {
        claims.require(Permission::Add(Resource::BookInstance))?;
        form.validate()?;
        form.check_consistency()?;

        let instance = self.store.create(&form).await?;
        tracing::info!(id = %instance.id, book_id = instance.book_id, "Book instance created");
        Ok(instance.with_overdue(self.clock.today()))
    }

    pub async fn update(
        &self,
        claims: &UserClaims,
        id: Uuid,
        form: BookInstanceForm,
    ) -> AppResult<BookInstance> {
        claims.require(Permission::Change(Resource::BookInstance))?;
        form.validate()?;
        form.check_consistency()?;

        let instance = self.store.update(id, &form).await?.ok_or_else(|| not_found(id))?;
        Ok(instance.with_overdue(self.clock.today()))
    }

    pub async fn delete(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        claims.require(Permission::Delete(Resource::BookInstance))?;

        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(id = %id, "Book instance deleted");
        Ok(())
    }

    /// Copies on loan to the requesting member, earliest due date first
    pub async fn borrowed_by(
        &self,
        claims: &UserClaims,
        page: &PageQuery,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        let (instances, total) = self
            .store
            .list_on_loan(Some(claims.user_id), page.offset(self.page_size), self.page_size)
            .await?;
        Ok((self.flag_overdue(instances), total))
    }

    /// Every copy on loan, earliest due date first
    pub async fn all_borrowed(
        &self,
        claims: &UserClaims,
        page: &PageQuery,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        claims.require(Permission::CanMarkReturned)?;

        let (instances, total) = self
            .store
            .list_on_loan(None, page.offset(self.page_size), self.page_size)
            .await?;
        Ok((self.flag_overdue(instances), total))
    }

    /// The copy to renew and the due date suggested for it
    pub async fn renewal_form(&self, claims: &UserClaims, id: Uuid) -> AppResult<RenewalForm> {
        claims.require(Permission::CanMarkReturned)?;

        let instance = self.load(id).await?;
        Ok(RenewalForm {
            instance,
            proposed_due_back: default_renewal_date(self.clock.today()),
        })
    }

    /// Set a new due date on any member's copy
    pub async fn renew(
        &self,
        claims: &UserClaims,
        id: Uuid,
        proposed: chrono::NaiveDate,
    ) -> AppResult<BookInstance> {
        claims.require(Permission::CanMarkReturned)?;

        let instance = self.load(id).await?;
        let due_back = validate_renewal(proposed, self.clock.today())?;
        check_consistency(instance.status, instance.borrower_id, Some(due_back))?;

        let renewed = self
            .store
            .set_due_back(instance.id, due_back)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(
            id = %id,
            librarian = %claims.sub,
            previous = ?instance.due_back,
            due_back = %due_back,
            "Loan renewed"
        );
        Ok(renewed.with_overdue(self.clock.today()))
    }

    /// Lend an available copy to a member
    pub async fn checkout(
        &self,
        claims: &UserClaims,
        id: Uuid,
        request: CheckoutRequest,
    ) -> AppResult<BookInstance> {
        claims.require(Permission::CanMarkReturned)?;

        let instance = self.load(id).await?;
        if instance.status != LoanStatus::Available {
            return Err(AppError::Conflict(format!(
                "Book instance {} is not available ({})",
                id, instance.status
            )));
        }

        let today = self.clock.today();
        let proposed = request.due_back.unwrap_or_else(|| default_renewal_date(today));
        let due_back = validate_renewal(proposed, today)?;
        check_consistency(LoanStatus::OnLoan, Some(request.borrower_id), Some(due_back))?;

        let lent = self
            .store
            .set_loan(id, LoanStatus::OnLoan, Some(request.borrower_id), Some(due_back))
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(id = %id, borrower_id = request.borrower_id, due_back = %due_back, "Book instance lent");
        Ok(lent.with_overdue(today))
    }

    /// Mark a copy on loan as returned and available again
    pub async fn mark_returned(&self, claims: &UserClaims, id: Uuid) -> AppResult<BookInstance> {
        claims.require(Permission::CanMarkReturned)?;

        let instance = self.load(id).await?;
        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::Conflict(format!(
                "Book instance {} is not on loan ({})",
                id, instance.status
            )));
        }

        let returned = self
            .store
            .set_loan(id, LoanStatus::Available, None, None)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(id = %id, was_overdue = instance.is_overdue, "Book instance returned");
        Ok(returned.with_overdue(self.clock.today()))
    }

    pub async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        self.store.count(status).await
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book instance {} not found", id))
}
